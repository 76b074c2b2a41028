fn main() {
    // Host builds (tests, the serial CLI) have no ESP-IDF environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
