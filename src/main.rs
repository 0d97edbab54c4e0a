fn main() {
    if let Err(e) = feedpack::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
