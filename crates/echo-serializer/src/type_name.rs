//! Structured type-name notation.
//!
//! ```text
//! i            compact primitive code or registered name
//! e:Color      enum
//! i[]          one-dimensional array
//! i[,]         rank-2 array
//! Pair<i,st[]> generic with arguments
//! ```

use std::fmt;

use crate::TypeNameError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Named(String),
    Enum(String),
    Array { element: Box<TypeName>, rank: usize },
    Generic { base: String, args: Vec<TypeName> },
}

impl TypeName {
    pub fn named(name: impl Into<String>) -> Self {
        TypeName::Named(name.into())
    }

    pub fn array(element: TypeName) -> Self {
        TypeName::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    pub fn parse(input: &str) -> Result<Self, TypeNameError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TypeNameError::Empty);
        }
        if s.ends_with(']') {
            let open = s
                .rfind('[')
                .ok_or_else(|| TypeNameError::Unbalanced(s.to_string()))?;
            let dims = &s[open + 1..s.len() - 1];
            if !dims.chars().all(|c| c == ',') || open == 0 {
                return Err(TypeNameError::Invalid(s.to_string()));
            }
            return Ok(TypeName::Array {
                element: Box::new(Self::parse(&s[..open])?),
                rank: dims.len() + 1,
            });
        }
        if let Some(name) = s.strip_prefix("e:") {
            if name.is_empty() || name.contains(['<', '>', '[', ']', ',']) {
                return Err(TypeNameError::Invalid(s.to_string()));
            }
            return Ok(TypeName::Enum(name.to_string()));
        }
        if s.ends_with('>') {
            let open = s
                .find('<')
                .ok_or_else(|| TypeNameError::Unbalanced(s.to_string()))?;
            let base = s[..open].trim();
            if base.is_empty() {
                return Err(TypeNameError::Invalid(s.to_string()));
            }
            let args = split_top_level(&s[open + 1..s.len() - 1])
                .ok_or_else(|| TypeNameError::Unbalanced(s.to_string()))?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TypeName::Generic {
                base: base.to_string(),
                args,
            });
        }
        if s.contains(['<', '>', '[', ']']) {
            return Err(TypeNameError::Unbalanced(s.to_string()));
        }
        if s.contains(',') {
            return Err(TypeNameError::Invalid(s.to_string()));
        }
        Ok(TypeName::Named(s.to_string()))
    }

    /// Rewrites rank-n arrays as n nested rank-1 arrays.
    pub fn canonical(&self) -> TypeName {
        match self {
            TypeName::Named(_) | TypeName::Enum(_) => self.clone(),
            TypeName::Array { element, rank } => {
                let mut out = element.canonical();
                for _ in 0..(*rank).max(1) {
                    out = TypeName::array(out);
                }
                out
            }
            TypeName::Generic { base, args } => TypeName::Generic {
                base: base.clone(),
                args: args.iter().map(TypeName::canonical).collect(),
            },
        }
    }
}

/// Splits on commas that are not nested inside `<>` or `[]`.
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&s[start..]);
    Some(parts)
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Named(name) => f.write_str(name),
            TypeName::Enum(name) => write!(f, "e:{name}"),
            TypeName::Array { element, rank } => {
                write!(f, "{element}[{}]", ",".repeat(rank.saturating_sub(1)))
            }
            TypeName::Generic { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}
