use clap::Parser;
use pair_formation::runner::{run_with_args, BaseArgs};

fn main() {
    let args = BaseArgs::parse();
    if let Err(error) = run_with_args(&args) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
