use crate::{
    location::{escape, unescape},
    params::ParamsMap,
    RouterError,
};
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// A compiled route pattern such as `/user/:id`.
///
/// Each `:name` marker matches one or more characters other than `/`.
/// Everything else in the pattern matches literally, and a single trailing
/// slash on the candidate path is tolerated.
#[derive(Clone)]
pub struct Matcher {
    pattern: String,
    tokens: Vec<Token>,
    param_names: Vec<String>,
    regex: Regex,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .finish()
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Matcher {}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(colon) = rest.find(':') {
        let after = &rest[colon + 1..];
        let name_len = after
            .find(|c: char| !is_name_char(c))
            .unwrap_or(after.len());
        literal.push_str(&rest[..colon]);
        if name_len == 0 {
            // a bare `:` is literal
            literal.push(':');
        } else {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Param(after[..name_len].to_string()));
        }
        rest = &after[name_len..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

impl Matcher {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> Result<Self, RouterError> {
        let tokens = tokenize(pattern);
        let mut source = String::from("^");
        let mut param_names = Vec::new();
        for token in &tokens {
            match token {
                Token::Literal(text) => source.push_str(&regex::escape(text)),
                Token::Param(name) => {
                    source.push_str("([^/]+)");
                    param_names.push(name.clone());
                }
            }
        }
        source.push_str("/?$");

        let regex =
            Regex::new(&source).map_err(|source| RouterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            tokens,
            param_names,
            regex,
        })
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in order of appearance.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Tests `path` against the pattern, returning the decoded parameters on
    /// a match.
    ///
    /// A captured value that does not percent-decode to UTF-8 is treated as
    /// a mismatch.
    pub fn test(&self, path: &str) -> Option<ParamsMap> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamsMap::with_capacity(self.param_names.len());
        for (name, value) in self.param_names.iter().zip(captures.iter().skip(1)) {
            let value = value?.as_str();
            params.insert(name.clone(), unescape(value)?);
        }
        Some(params)
    }

    /// Builds a concrete path by substituting encoded `params` for each
    /// `:name` marker.
    pub fn generate(&self, params: &ParamsMap) -> Result<String, RouterError> {
        let mut path = String::with_capacity(self.pattern.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => path.push_str(text),
                Token::Param(name) => {
                    let value = params
                        .get_str(name)
                        .ok_or_else(|| RouterError::MissingParam(name.clone()))?;
                    path.push_str(&escape(value));
                }
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params_map;

    #[test]
    fn tokenizes_params_and_literals() {
        assert_eq!(
            tokenize("/user/:id/posts/:post_id"),
            vec![
                Token::Literal("/user/".into()),
                Token::Param("id".into()),
                Token::Literal("/posts/".into()),
                Token::Param("post_id".into()),
            ]
        );
        assert_eq!(tokenize("/a:/b"), vec![Token::Literal("/a:/b".into())]);
        assert_eq!(tokenize(""), Vec::<Token>::new());
    }

    #[test]
    fn metacharacters_are_literal() {
        let matcher = Matcher::new("/file.txt").unwrap();
        assert!(matcher.test("/file.txt").is_some());
        assert!(matcher.test("/fileXtxt").is_none());

        let matcher = Matcher::new("/a+(b)").unwrap();
        assert!(matcher.test("/a+(b)").is_some());
        assert!(matcher.test("/aa(b)").is_none());
    }

    #[test]
    fn generate_encodes_values() {
        let matcher = Matcher::new("/search/:q").unwrap();
        assert_eq!(
            matcher.generate(&params_map!("q" => "a b/c")).unwrap(),
            "/search/a%20b%2Fc"
        );
    }

    #[test]
    fn generate_fails_on_missing_param() {
        let matcher = Matcher::new("/user/:id/:tab").unwrap();
        let err = matcher.generate(&params_map!("id" => "1")).unwrap_err();
        assert!(matches!(err, RouterError::MissingParam(name) if name == "tab"));
    }
}
