fn main() {
    // Exports the ESP-IDF environment for the espidf build; no-op on the host.
    embuild::espidf::sysenv::output();
}
