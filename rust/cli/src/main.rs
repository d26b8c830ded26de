use std::io;

fn main() {
    solvegate_web::init_logging();
    let code = solvegate_cli::run(std::env::args(), &mut io::stdout(), &mut io::stderr());
    std::process::exit(code);
}
