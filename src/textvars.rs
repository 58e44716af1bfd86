//! Text variables: `${name}` placeholders replaced in database lines before
//! they are interpreted.
//!
//! A variable may hold several values. A line using it then expands into one
//! line per value, which is mostly useful on the left hand side:
//!
//! ```
//! use calibdb::scan::Substitute;
//! use calibdb::textvars::TextVars;
//! let mut vars = TextVars::new();
//! vars.set("plane", ["u1", "v1"]);
//! assert_eq!(
//!     vars.substitute("L.vdc.${plane}.nw = 368"),
//!     vec!["L.vdc.u1.nw = 368", "L.vdc.v1.nw = 368"]
//! );
//! ```

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::scan::Substitute;

lazy_static! {
    static ref VARIABLE: Regex = Regex::new(r"\$\{(\w+)\}").unwrap();
}

#[derive(Debug, Default, Clone)]
pub struct TextVars {
    vars: HashMap<String, Vec<String>>,
}

impl TextVars {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vars
            .insert(name.to_owned(), values.into_iter().map(Into::into).collect());
    }
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(|v| v.as_slice())
    }
    pub fn remove(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }
    pub fn len(&self) -> usize {
        self.vars.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Substitute for TextVars {
    fn substitute(&self, line: &str) -> Vec<String> {
        // first placeholder with a known, non-empty variable
        let known = VARIABLE.captures_iter(line).find_map(|c| {
            let whole = c.get(0)?;
            let values = self.vars.get(c.get(1)?.as_str())?;
            (!values.is_empty()).then_some((whole.range(), values))
        });
        let Some((range, values)) = known else {
            return vec![line.to_owned()];
        };
        // placeholders further along the line, cartesian product
        let tails = self.substitute(&line[range.end..]);
        let mut lines = Vec::with_capacity(values.len() * tails.len());
        for value in values {
            for tail in &tails {
                lines.push(format!("{}{}{}", &line[..range.start], value, tail));
            }
        }
        lines
    }
}
