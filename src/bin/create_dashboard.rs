use solution_dashboard::generator::{BAKED_OUTPUT, generate, paths_from_args};
use solution_dashboard::strategy::BakedValues;
use std::env;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (input, output) = paths_from_args(env::args().skip(1), BAKED_OUTPUT);

    match generate(&input, &output, BakedValues) {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
