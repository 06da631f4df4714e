fn main() {
    if let Err(err) = txn_report::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
