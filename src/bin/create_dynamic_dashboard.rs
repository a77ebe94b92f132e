use solution_dashboard::generator::{LIVE_OUTPUT, generate, paths_from_args};
use solution_dashboard::strategy::LiveFormulas;
use std::env;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (input, output) = paths_from_args(env::args().skip(1), LIVE_OUTPUT);

    match generate(&input, &output, LiveFormulas) {
        Ok(report) => {
            println!("{}", report);
            println!();
            println!("Edit the 'Data' sheet and the dashboard recalculates on open.");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
