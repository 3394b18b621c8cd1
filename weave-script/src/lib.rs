pub mod anim;
pub mod ast;
pub mod command;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod writer;

pub use ast::Dialog;
pub use error::{CompileError, ErrorKind};
pub use source::{AnimationSource, AssetKind, MemorySource};

/// Compiles raw script bytes. Rejects input that is not valid UTF-8.
pub fn compile(file: &str, bytes: &[u8], source: &mut dyn AnimationSource) -> error::Result<Dialog> {
    match std::str::from_utf8(bytes) {
        Ok(src) => compile_str(file, src, source),
        Err(e) => {
            let valid = &bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Err(CompileError::new(file, line, ErrorKind::InvalidEncoding))
        }
    }
}

pub fn compile_str(file: &str, src: &str, source: &mut dyn AnimationSource) -> error::Result<Dialog> {
    let toks = lexer::tokenize(file, src)?;
    log::trace!("{}: {} tokens", file, toks.len());
    parser::Parser::new(file, &toks, source).parse()
}
