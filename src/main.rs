fn main() {
    if let Err(err) = neural_interface::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
