//! Lexical layer of the structural editor: reader character classes, tokens,
//! the re-lexed document mirror and the token cursor over it.

pub mod chars;
pub mod cursor;
pub mod lexer;
pub mod token;
