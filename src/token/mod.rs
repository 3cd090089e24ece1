//! The token model: the closed set of lexical kinds the scanner produces, and the `Token`
//! record that carries a kind alongside its source position. See `crate::lexer` for the
//! scanner that produces these, and `crate::parser` for the consumer.

use convert_case::Casing as _;

/// A lexical category of token. This is a closed set; the scanner never produces a `TokenKind`
/// outside this enum, and `Illegal` is how it reports input it doesn't recognize instead of
/// failing outright (see `crate::lexer`).
#[derive(strum_macros::EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	// Literals
	Int,
	Float,
	Bool,
	Char,
	Str,

	// Identifiers / type keyword
	Identifier,
	Type,

	// Structural
	Eol,
	Eof,
	LineComment,
	Illegal,
	LeftParen,
	RightParen,
	Comma,
	Dot,

	// Assignment family
	DeclareAssign, // :=
	Colon,         // :
	Assign,        // =

	// Arithmetic
	Plus,
	Minus,
	Asterisk,
	Slash,
	Percent,

	// Comparison
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,

	// Range
	Range,      // ..
	RangeIncl,  // ..=

	// Logical
	Bang, // !
	And,
	Or,
	Xor,
	Not,

	// Keywords
	If,
	Else,
	For,
	End,
	In,
	Func,
	Return,
	Import,
}

impl TokenKind {
	/// Whether this kind is one of the binary/unary operator kinds enumerated in spec §4.A.
	/// `Bang` is included because it doubles as the unary NOT operator.
	#[must_use]
	pub const fn is_operator(self) -> bool {
		matches!(
			self,
			Self::Plus
				| Self::Minus | Self::Asterisk
				| Self::Slash | Self::Percent
				| Self::Eq | Self::NotEq
				| Self::Lt | Self::LtEq
				| Self::Gt | Self::GtEq
				| Self::And | Self::Or
				| Self::Xor | Self::Bang
		)
	}
}

impl std::fmt::Display for TokenKind {
	/// Renders the kind's variant name in Title Case, e.g. `Self::LeftParen` becomes "Left Paren".
	/// Used to build human-readable parser/compiler diagnostics.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A case-sensitive keyword lookup table. Returns `None` (meaning: treat it as an identifier)
/// if `word` isn't a reserved keyword or type name.
#[must_use]
pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
	Some(match word {
		"if" => TokenKind::If,
		"else" => TokenKind::Else,
		"for" => TokenKind::For,
		"end" => TokenKind::End,
		"in" => TokenKind::In,
		"func" => TokenKind::Func,
		"return" => TokenKind::Return,
		"import" => TokenKind::Import,
		"and" => TokenKind::And,
		"or" => TokenKind::Or,
		"xor" => TokenKind::Xor,
		"not" => TokenKind::Not,
		"true" | "false" => TokenKind::Bool,
		"int" | "float" | "char" | "string" | "bool" | "void" => TokenKind::Type,
		_ => return None,
	})
}

/// Whether `kind` may appear in a type-annotation position (a `Declare`'s type, a parameter's
/// type, or a function's return type). `Func` is included because "func" names the function
/// type as well as introducing a `FunctionDefinition` statement; the parser disambiguates by
/// position, not by token kind.
#[must_use]
pub const fn is_type_token(kind: TokenKind) -> bool {
	matches!(kind, TokenKind::Type | TokenKind::Func)
}

/// A token produced by the scanner: its kind, the verbatim source text it was scanned from,
/// and its position. The lexeme is used verbatim by the parser when parsing number/string/char
/// literals and when echoing operators/keywords in diagnostics.
#[derive(Debug, Clone)]
pub struct Token {
	pub kind: TokenKind,
	pub lexeme: String,
	/// Absolute byte offset of the token's first byte in the source text.
	pub position: usize,
	/// 1-based line number.
	pub line: usize,
	/// Column within the line (0-based, per spec invariant 2: `column >= 0`).
	pub column: usize,
}

impl Token {
	#[must_use]
	pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: usize, line: usize, column: usize) -> Self {
		Self {
			kind,
			lexeme: lexeme.into(),
			position,
			line,
			column,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use strum::IntoEnumIterator as _;

	#[test]
	fn keyword_table_round_trips() {
		let keywords = ["if", "else", "for", "end", "in", "func", "return", "import", "and", "or", "xor", "not"];
		for keyword in keywords {
			assert!(lookup_keyword(keyword).is_some(), "{keyword} should be a recognized keyword");
		}
	}

	#[test]
	fn non_keywords_are_not_looked_up() {
		for identifier in ["x", "foo_bar", "Print", "IF"] {
			assert_eq!(lookup_keyword(identifier), None);
		}
	}

	#[test]
	fn every_token_kind_has_a_title_case_display() {
		for kind in TokenKind::iter() {
			let rendered = kind.to_string();
			assert!(!rendered.is_empty());
		}
	}

	#[test]
	fn operator_classification_matches_spec() {
		assert!(TokenKind::Plus.is_operator());
		assert!(TokenKind::Bang.is_operator());
		assert!(!TokenKind::LeftParen.is_operator());
		assert!(!TokenKind::If.is_operator());
	}
}
