//! The scanner: turns a UTF-8 source buffer into a stream of [`Token`]s, one at a time, on
//! request. See `crate::token` for the token model this produces and `crate::parser` for the
//! consumer.
//!
//! Malformed input never aborts scanning: an unrecognised byte becomes an `Illegal` token and
//! the scanner keeps going. All diagnostics live upstream, in the parser.

use crate::token::{lookup_keyword, Token, TokenKind};

/// Scans `source` one token at a time. Tracks an absolute byte position, a 1-based line number,
/// and a column within the line, all carried onto every emitted `Token`.
pub struct Lexer {
	chars: Vec<char>,
	pos: usize,
	byte_pos: usize,
	line: usize,
	column: usize,
}

impl Lexer {
	#[must_use]
	pub fn new(source: &str) -> Self {
		Self {
			chars: source.chars().collect(),
			pos: 0,
			byte_pos: 0,
			line: 1,
			column: 0,
		}
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn peek_at(&self, offset: usize) -> Option<char> {
		self.chars.get(self.pos + offset).copied()
	}

	/// Consumes and returns the current char, advancing position, line, and column.
	fn advance(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += 1;
		self.byte_pos += c.len_utf8();
		if c == '\n' {
			self.line += 1;
			self.column = 0;
		} else {
			self.column += 1;
		}
		Some(c)
	}

	fn is_inline_whitespace(c: char) -> bool {
		matches!(c, ' ' | '\t' | '\r')
	}

	fn skip_inline_whitespace(&mut self) {
		while self.peek().is_some_and(Self::is_inline_whitespace) {
			self.advance();
		}
	}

	/// Returns the next token in the stream. Returns an `Eof` token forever once the input is
	/// exhausted, so callers can poll without tracking end-of-stream themselves.
	pub fn next_token(&mut self) -> Token {
		self.skip_inline_whitespace();

		let start_pos = self.byte_pos;
		let start_line = self.line;
		let start_col = self.column;

		let Some(c) = self.peek() else {
			return Token::new(TokenKind::Eof, "", start_pos, start_line, start_col);
		};

		if c == '\n' {
			return self.scan_eol(start_pos, start_line, start_col);
		}
		if c == '/' && self.peek_at(1) == Some('/') {
			return self.scan_line_comment(start_pos, start_line, start_col);
		}
		if c.is_ascii_digit() {
			return self.scan_number(start_pos, start_line, start_col);
		}
		if c.is_alphabetic() || c == '_' {
			return self.scan_identifier(start_pos, start_line, start_col);
		}
		if c == '\'' {
			return self.scan_char(start_pos, start_line, start_col);
		}
		if c == '"' {
			return self.scan_string(start_pos, start_line, start_col);
		}
		self.scan_operator(start_pos, start_line, start_col)
	}

	/// A run of one or more newlines (with only inline whitespace between them) collapses to a
	/// single `Eol` token.
	fn scan_eol(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		while self.peek().is_some_and(|c| c == '\n' || Self::is_inline_whitespace(c)) {
			self.advance();
		}
		Token::new(TokenKind::Eol, "\n", start_pos, start_line, start_col)
	}

	/// The comment's text is the token's lexeme; the caller (parser) is the one that skips
	/// forward to the following `Eol`, per the statement-dispatch rule for `//`.
	fn scan_line_comment(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		self.advance();
		self.advance();
		let mut text = String::new();
		while let Some(c) = self.peek() {
			if c == '\n' {
				break;
			}
			text.push(c);
			self.advance();
		}
		Token::new(TokenKind::LineComment, text, start_pos, start_line, start_col)
	}

	/// Digits lex as `Int`; if a `.` is immediately followed by another digit (and isn't the
	/// start of a `..`/`..=` range token), the run extends into a `Float` lexeme.
	fn scan_number(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		let mut lexeme = String::new();
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			lexeme.push(self.advance().expect("peeked digit"));
		}

		let mut kind = TokenKind::Int;
		if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
			lexeme.push(self.advance().expect("peeked '.'"));
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				lexeme.push(self.advance().expect("peeked digit"));
			}
			kind = TokenKind::Float;
		}

		Token::new(kind, lexeme, start_pos, start_line, start_col)
	}

	fn scan_identifier(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		let mut lexeme = String::new();
		while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
			lexeme.push(self.advance().expect("peeked identifier char"));
		}
		let kind = lookup_keyword(&lexeme).unwrap_or(TokenKind::Identifier);
		Token::new(kind, lexeme, start_pos, start_line, start_col)
	}

	/// `'X'`, one Unicode scalar between quotes. An unterminated or empty literal becomes
	/// `Illegal` carrying what was actually seen.
	fn scan_char(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		self.advance();
		let Some(scalar) = self.advance() else {
			return Token::new(TokenKind::Illegal, "'", start_pos, start_line, start_col);
		};
		if self.peek() == Some('\'') {
			self.advance();
			Token::new(TokenKind::Char, scalar.to_string(), start_pos, start_line, start_col)
		} else {
			Token::new(TokenKind::Illegal, format!("'{scalar}"), start_pos, start_line, start_col)
		}
	}

	/// `"..."`, no interior escape processing. Unterminated strings (hitting EOL/EOF first)
	/// become `Illegal` carrying the partial text.
	fn scan_string(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		self.advance();
		let mut text = String::new();
		loop {
			match self.peek() {
				Some('"') => {
					self.advance();
					return Token::new(TokenKind::Str, text, start_pos, start_line, start_col);
				}
				Some('\n') | None => return Token::new(TokenKind::Illegal, format!("\"{text}"), start_pos, start_line, start_col),
				Some(c) => {
					text.push(c);
					self.advance();
				}
			}
		}
	}

	/// Two-char (and the three-char `..=`) forms are tried by one-byte lookahead before falling
	/// back to the single-char prefix; anything unrecognised is `Illegal`.
	fn scan_operator(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
		let c = self.advance().expect("scan_operator called at a real char");

		macro_rules! tok {
			($kind:expr, $lexeme:expr) => {
				Token::new($kind, $lexeme, start_pos, start_line, start_col)
			};
		}

		match c {
			'(' => tok!(TokenKind::LeftParen, "("),
			')' => tok!(TokenKind::RightParen, ")"),
			',' => tok!(TokenKind::Comma, ","),
			':' if self.peek() == Some('=') => {
				self.advance();
				tok!(TokenKind::DeclareAssign, ":=")
			}
			':' => tok!(TokenKind::Colon, ":"),
			'=' if self.peek() == Some('=') => {
				self.advance();
				tok!(TokenKind::Eq, "==")
			}
			'=' => tok!(TokenKind::Assign, "="),
			'!' if self.peek() == Some('=') => {
				self.advance();
				tok!(TokenKind::NotEq, "!=")
			}
			'!' => tok!(TokenKind::Bang, "!"),
			'<' if self.peek() == Some('=') => {
				self.advance();
				tok!(TokenKind::LtEq, "<=")
			}
			'<' => tok!(TokenKind::Lt, "<"),
			'>' if self.peek() == Some('=') => {
				self.advance();
				tok!(TokenKind::GtEq, ">=")
			}
			'>' => tok!(TokenKind::Gt, ">"),
			'.' if self.peek() == Some('.') && self.peek_at(1) == Some('=') => {
				self.advance();
				self.advance();
				tok!(TokenKind::RangeIncl, "..=")
			}
			'.' if self.peek() == Some('.') => {
				self.advance();
				tok!(TokenKind::Range, "..")
			}
			'.' => tok!(TokenKind::Dot, "."),
			'+' => tok!(TokenKind::Plus, "+"),
			'-' => tok!(TokenKind::Minus, "-"),
			'*' => tok!(TokenKind::Asterisk, "*"),
			'/' => tok!(TokenKind::Slash, "/"),
			'%' => tok!(TokenKind::Percent, "%"),
			other => tok!(TokenKind::Illegal, other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(source: &str) -> Vec<TokenKind> {
		let mut lexer = Lexer::new(source);
		let mut out = Vec::new();
		loop {
			let token = lexer.next_token();
			let done = token.kind == TokenKind::Eof;
			out.push(token.kind);
			if done {
				break;
			}
		}
		out
	}

	#[test]
	fn scans_declare_assign_and_int() {
		assert_eq!(kinds("x := 5"), vec![TokenKind::Identifier, TokenKind::DeclareAssign, TokenKind::Int, TokenKind::Eof]);
	}

	#[test]
	fn scans_float_but_not_range() {
		assert_eq!(kinds("1.5"), vec![TokenKind::Float, TokenKind::Eof]);
		assert_eq!(kinds("1..5"), vec![TokenKind::Int, TokenKind::Range, TokenKind::Int, TokenKind::Eof]);
		assert_eq!(kinds("1..=5"), vec![TokenKind::Int, TokenKind::RangeIncl, TokenKind::Int, TokenKind::Eof]);
	}

	#[test]
	fn collapses_blank_lines_to_one_eol() {
		assert_eq!(kinds("x := 1\n\n\ny := 2"), vec![
			TokenKind::Identifier,
			TokenKind::DeclareAssign,
			TokenKind::Int,
			TokenKind::Eol,
			TokenKind::Identifier,
			TokenKind::DeclareAssign,
			TokenKind::Int,
			TokenKind::Eof,
		]);
	}

	#[test]
	fn comment_is_a_token_not_skipped() {
		assert_eq!(kinds("// hi\nx"), vec![TokenKind::LineComment, TokenKind::Eol, TokenKind::Identifier, TokenKind::Eof]);
	}

	#[test]
	fn illegal_byte_does_not_stop_scanning() {
		assert_eq!(kinds("x @ y"), vec![TokenKind::Identifier, TokenKind::Illegal, TokenKind::Identifier, TokenKind::Eof]);
	}

	#[test]
	fn unterminated_string_is_illegal() {
		assert_eq!(kinds("\"abc"), vec![TokenKind::Illegal, TokenKind::Eof]);
	}

	#[test]
	fn char_and_string_literals() {
		assert_eq!(kinds("'x' \"hi\""), vec![TokenKind::Char, TokenKind::Str, TokenKind::Eof]);
	}

	#[test]
	fn positions_advance_monotonically() {
		let mut lexer = Lexer::new("abc def");
		let first = lexer.next_token();
		let second = lexer.next_token();
		assert!(second.position > first.position);
		assert_eq!(first.line, 1);
		assert_eq!(first.column, 0);
	}

	#[test]
	fn keyword_and_type_name_lex_correctly() {
		assert_eq!(kinds("func if int"), vec![TokenKind::Func, TokenKind::If, TokenKind::Type, TokenKind::Eof]);
	}
}
