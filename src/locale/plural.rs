//! Evaluator for `Plural-Forms` expressions.
//!
//! The expression language is the C subset gettext allows: the variable
//! `n`, unsigned integer literals, `! * / % + - < <= > >= == != && ||`,
//! the ternary operator and parentheses.
use std::fmt;

use crate::error::LocaleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    N,
    Num(u64),
    Not(Box<Self>),
    Binary(BinOp, Box<Self>, Box<Self>),
    Cond(Box<Self>, Box<Self>, Box<Self>),
}

impl Expr {
    fn eval(&self, n: u64) -> u64 {
        match self {
            Self::N => n,
            Self::Num(v) => *v,
            Self::Not(e) => u64::from(e.eval(n) == 0),
            Self::Cond(c, t, f) => {
                if c.eval(n) == 0 {
                    f.eval(n)
                } else {
                    t.eval(n)
                }
            }
            Self::Binary(op, l, r) => {
                let (a, b) = (l.eval(n), r.eval(n));
                match op {
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div => a.checked_div(b).unwrap_or(0),
                    BinOp::Rem => a.checked_rem(b).unwrap_or(0),
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Lt => u64::from(a < b),
                    BinOp::Le => u64::from(a <= b),
                    BinOp::Gt => u64::from(a > b),
                    BinOp::Ge => u64::from(a >= b),
                    BinOp::Eq => u64::from(a == b),
                    BinOp::Ne => u64::from(a != b),
                    BinOp::And => u64::from(a != 0 && b != 0),
                    BinOp::Or => u64::from(a != 0 || b != 0),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(&'static str),
    LParen,
    RParen,
    Question,
    Colon,
}

/// Deepest nesting of parentheses, `!` and `?:` accepted.
const MAX_DEPTH: usize = 64;
/// Longest expression accepted, in tokens.
const MAX_TOKENS: usize = 1024;

const OPERATORS: &[&str] = &[
    "&&", "||", "==", "!=", "<=", ">=", "<", ">", "!", "+", "-", "*", "/", "%",
];

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = src.trim_start();
    while let Some(c) = rest.chars().next() {
        let (token, len) = if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            let digits = rest.get(..len).unwrap_or_default();
            let value = digits
                .parse()
                .map_err(|_| format!("number '{digits}' out of range"))?;
            (Token::Num(value), len)
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            (Token::Op(*op), op.len())
        } else {
            let token = match c {
                'n' => Token::N,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '?' => Token::Question,
                ':' => Token::Colon,
                _ => return Err(format!("unexpected character '{c}'")),
            };
            (token, c.len_utf8())
        };
        if tokens.len() == MAX_TOKENS {
            return Err(format!("more than {MAX_TOKENS} tokens"));
        }
        tokens.push(token);
        rest = rest.get(len..).unwrap_or_default().trim_start();
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expect(&mut self, want: Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == want => Ok(()),
            Some(t) => Err(format!("expected {want:?}, found {t:?}")),
            None => Err(format!("expected {want:?}, found end of input")),
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr, String>) -> Result<Expr, String> {
        if self.depth == MAX_DEPTH {
            return Err(format!("nested deeper than {MAX_DEPTH} levels"));
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    fn ternary(&mut self) -> Result<Expr, String> {
        let cond = self.binary(0)?;
        if self.peek() != Some(Token::Question) {
            return Ok(cond);
        }
        self.pos += 1;
        let then = self.nested(Self::ternary)?;
        self.expect(Token::Colon)?;
        let otherwise = self.nested(Self::ternary)?;
        Ok(Expr::Cond(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    /// Precedence climbing over the binary operators; level 0 binds loosest.
    fn binary(&mut self, level: usize) -> Result<Expr, String> {
        const LEVELS: &[&[(&str, BinOp)]] = &[
            &[("||", BinOp::Or)],
            &[("&&", BinOp::And)],
            &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
            &[
                ("<", BinOp::Lt),
                ("<=", BinOp::Le),
                (">", BinOp::Gt),
                (">=", BinOp::Ge),
            ],
            &[("+", BinOp::Add), ("-", BinOp::Sub)],
            &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
        ];
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut lhs = self.binary(level + 1)?;
        while let Some(Token::Op(text)) = self.peek() {
            let Some(&(_, op)) = ops.iter().find(|(t, _)| *t == text) else {
                break;
            };
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Op("!")) => Ok(Expr::Not(Box::new(self.nested(Self::unary)?))),
            Some(Token::N) => Ok(Expr::N),
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::ternary)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(t) => Err(format!("unexpected {t:?}")),
            None => Err("unexpected end of input".to_string()),
        }
    }
}

/// A compiled plural rule mapping a count to a plural form index.
#[derive(Clone, PartialEq, Eq)]
pub struct PluralRule {
    source: String,
    expr: Expr,
}

impl PluralRule {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleError::InvalidPluralRule`] if the expression does not parse.
    pub fn parse(expression: &str) -> Result<Self, LocaleError> {
        let invalid = |reason: String| LocaleError::InvalidPluralRule {
            expression: expression.to_string(),
            reason,
        };
        let tokens = tokenize(expression).map_err(invalid)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.ternary().map_err(invalid)?;
        if let Some(extra) = parser.peek() {
            return Err(invalid(format!("trailing {extra:?}")));
        }
        Ok(Self {
            source: expression.trim().to_string(),
            expr,
        })
    }

    /// Form index for `n`.
    #[must_use]
    pub fn index(&self, n: u64) -> u64 {
        self.expr.eval(n)
    }

    /// Expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Default for PluralRule {
    /// The Germanic rule `n != 1`.
    fn default() -> Self {
        Self {
            source: "n != 1".to_string(),
            expr: Expr::Binary(BinOp::Ne, Box::new(Expr::N), Box::new(Expr::Num(1))),
        }
    }
}

impl fmt::Debug for PluralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluralRule").field(&self.source).finish()
    }
}
