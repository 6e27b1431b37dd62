//! Element selectors understood by every [`Browser`](crate::browser::Browser) backend.
//!
//! Selectors are written in configuration as `kind=value` strings
//! (`id=username`, `css=a.row`, `xpath=//a`). A bare string is taken as CSS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
	Id(String),
	Name(String),
	Class(String),
	Css(String),
	XPath(String),
}

impl Selector {
	pub fn id(value: impl Into<String>) -> Self {
		Selector::Id(value.into())
	}

	pub fn name(value: impl Into<String>) -> Self {
		Selector::Name(value.into())
	}

	pub fn class(value: impl Into<String>) -> Self {
		Selector::Class(value.into())
	}

	pub fn css(value: impl Into<String>) -> Self {
		Selector::Css(value.into())
	}

	pub fn xpath(value: impl Into<String>) -> Self {
		Selector::XPath(value.into())
	}

	/// Raw selector text without the kind prefix.
	pub fn value(&self) -> &str {
		match self {
			Selector::Id(v) | Selector::Name(v) | Selector::Class(v) | Selector::Css(v) | Selector::XPath(v) => v,
		}
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Selector::Id(v) => write!(f, "id={v}"),
			Selector::Name(v) => write!(f, "name={v}"),
			Selector::Class(v) => write!(f, "class={v}"),
			Selector::Css(v) => write!(f, "css={v}"),
			Selector::XPath(v) => write!(f, "xpath={v}"),
		}
	}
}

impl FromStr for Selector {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err("selector must not be empty".into());
		}

		let parsed = match s.split_once('=') {
			Some(("id", v)) => Selector::Id(v.to_string()),
			Some(("name", v)) => Selector::Name(v.to_string()),
			Some(("class", v)) => Selector::Class(v.to_string()),
			Some(("css", v)) => Selector::Css(v.to_string()),
			Some(("xpath", v)) => Selector::XPath(v.to_string()),
			_ if s.starts_with("//") || s.starts_with("(//") => Selector::XPath(s.to_string()),
			_ => Selector::Css(s.to_string()),
		};

		if parsed.value().is_empty() {
			return Err(format!("selector has no value: {s}"));
		}
		Ok(parsed)
	}
}

impl TryFrom<String> for Selector {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Selector> for String {
	fn from(selector: Selector) -> Self {
		selector.to_string()
	}
}
