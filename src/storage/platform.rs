//! Platform / feature-flag expressions
//!
//! Items can carry an expression such as `"android|ios"` or
//! `"!webgl & beta"` that decides whether they exist on the running build.
//! Identifiers are matched case-insensitively against the active flags.
//! `!` negates, `&` binds tighter than `|`, parentheses group. An empty
//! expression is always true.

/// Evaluates `expression` against the active `flags`
///
/// A malformed expression is logged and evaluates to false, hiding the
/// item rather than leaking it onto every platform.
pub fn evaluate(expression: &str, flags: &[String]) -> bool {
    let tokens = tokenize(expression);
    if tokens.is_empty() {
        return true;
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        flags,
    };
    match parser.or_expr() {
        Some(value) if parser.pos == tokens.len() => value,
        _ => {
            log::warn!("Malformed platform expression '{}'", expression);
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut ident = String::new();

    let flush = |ident: &mut String, tokens: &mut Vec<Token>| {
        if !ident.is_empty() {
            tokens.push(Token::Ident(std::mem::take(ident)));
        }
    };

    for c in expression.chars() {
        let op = match c {
            '!' => Some(Token::Not),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            _ => None,
        };
        if let Some(op) = op {
            flush(&mut ident, &mut tokens);
            tokens.push(op);
        } else if c.is_whitespace() {
            flush(&mut ident, &mut tokens);
        } else {
            ident.push(c);
        }
    }
    flush(&mut ident, &mut tokens);
    tokens
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    flags: &'a [String],
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Option<bool> {
        let mut value = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            value = value || rhs;
        }
        Some(value)
    }

    fn and_expr(&mut self) -> Option<bool> {
        let mut value = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.unary()?;
            value = value && rhs;
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<bool> {
        match self.next()?.clone() {
            Token::Not => self.unary().map(|v| !v),
            Token::Open => {
                let value = self.or_expr()?;
                (self.next()? == &Token::Close).then_some(value)
            }
            Token::Ident(name) => Some(self.flags.iter().any(|f| f.eq_ignore_ascii_case(&name))),
            Token::And | Token::Or | Token::Close => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_is_true() {
        assert!(evaluate("", &[]));
        assert!(evaluate("   ", &flags(&["ios"])));
    }

    #[test]
    fn test_identifier_case_insensitive() {
        assert!(evaluate("Android", &flags(&["android"])));
        assert!(!evaluate("ios", &flags(&["android"])));
    }

    #[test]
    fn test_operators() {
        let active = flags(&["android", "beta"]);
        assert!(evaluate("ios|android", &active));
        assert!(evaluate("android & beta", &active));
        assert!(!evaluate("android & !beta", &active));
        assert!(evaluate("!webgl", &active));
        // & binds tighter than |
        assert!(evaluate("ios & beta | android", &active));
        assert!(!evaluate("ios & (beta | android)", &active));
    }

    #[test]
    fn test_malformed_is_false() {
        let active = flags(&["android"]);
        assert!(!evaluate("android |", &active));
        assert!(!evaluate("(android", &active));
        assert!(!evaluate("android)", &active));
    }
}
