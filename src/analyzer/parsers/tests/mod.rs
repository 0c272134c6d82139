
use crate::preprocessor::{Preprocessor, TokenPreprocessor};
use crate::tokenizer::token::{Token, Tokenizer};

fn tokens(input: &str) -> Vec<Token> {
    let spans = Tokenizer::new().tokenize(input).unwrap();
    TokenPreprocessor::default()
        .process(spans)
        .into_iter()
        .map(|span| span.token)
        .collect()
}
