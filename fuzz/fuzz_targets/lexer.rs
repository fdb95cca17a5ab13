#![no_main]
use libfuzzer_sys::fuzz_target;
use log::debug;
use queuen_parser::TokenStream;

fuzz_target!(|data: &str| {
    drop(env_logger::try_init());

    let mut stream = TokenStream::new(data);
    loop {
        match stream.next() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(error) => {
                // The reconstruction invariant only holds for inputs that
                // tokenise completely.
                debug!("lex error: {error}");
                return;
            }
        }
    }

    // Everything consumed, whitespace and comments included, reconstructs
    // the input.
    assert_eq!(stream.log(), data);
});
