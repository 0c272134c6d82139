/// Reserved words of the expression language.
///
/// Keywords are only recognized when they form a whole identifier; the tokenizer reads an
/// identifier first and then checks it against this list.
#[derive(
    Debug, Clone, PartialEq, strum::EnumString, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    And,
    Or,
    Not,
    If,
    Then,
    Else,
    For,
    In,
    Return,
    Some,
    Every,
    Satisfies,
    Between,
    Instance,
    Of,
    True,
    False,
    Null,
}
