#![no_main]
use libfuzzer_sys::fuzz_target;
use log::debug;
use queuen_evaluator::Driver;
use queuen_parser::{parse_line, TokenStream};

fuzz_target!(|data: &str| {
    drop(env_logger::try_init());

    let driver = Driver::new().probe_budget(16);
    let mut stream = TokenStream::new(data);
    let mut sink = std::io::sink();
    loop {
        match parse_line(&mut stream) {
            Ok(None) => break,
            Ok(Some(statement)) => {
                if let Err(error) = driver.run(&statement, &mut sink) {
                    debug!("eval error: {error}");
                }
            }
            Err(error) => {
                debug!("parse error: {}", error.message());
                if error.is_lexical() {
                    break;
                }
            }
        }
    }
});
