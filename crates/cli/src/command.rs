//! Console commands and their tokenizer.
//!
//! A line is split on whitespace; the first token is the keyword (case-sensitive) and
//! the rest are positional arguments. Names therefore never contain whitespace.

use thiserror::Error;

use stockroom_products::Price;

pub const HELP: &str = "\
Commands:
  ADD_STORE <store>
  ADD_PRODUCT <product> <price>
  SHELVE_PRODUCT <product> <store>
  PRODUCT_STATISTICS
  CATALOG
  STOP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddStore { name: String },
    AddProduct { name: String, price: Price },
    ShelveProduct { product: String, store: String },
    ProductStatistics,
    Catalog,
    Stop,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid price: {0:?} (expected a non-negative integer)")]
    InvalidPrice(String),

    #[error("invalid input: line is not valid UTF-8")]
    InvalidUtf8,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = tokens.collect();

        let command = match keyword {
            "ADD_STORE" => match args[..] {
                [name] => Command::AddStore {
                    name: name.to_string(),
                },
                _ => return Err(CommandError::Usage("ADD_STORE <store>")),
            },
            "ADD_PRODUCT" => match args[..] {
                [name, price] => Command::AddProduct {
                    name: name.to_string(),
                    price: parse_price(price)?,
                },
                _ => return Err(CommandError::Usage("ADD_PRODUCT <product> <price>")),
            },
            "SHELVE_PRODUCT" => match args[..] {
                [product, store] => Command::ShelveProduct {
                    product: product.to_string(),
                    store: store.to_string(),
                },
                _ => return Err(CommandError::Usage("SHELVE_PRODUCT <product> <store>")),
            },
            "PRODUCT_STATISTICS" => {
                no_args(&args, Command::ProductStatistics, "PRODUCT_STATISTICS")?
            }
            "CATALOG" => no_args(&args, Command::Catalog, "CATALOG")?,
            "STOP" => no_args(&args, Command::Stop, "STOP")?,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn no_args(args: &[&str], command: Command, usage: &'static str) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(usage))
    }
}

fn parse_price(token: &str) -> Result<Price, CommandError> {
    token
        .parse::<i64>()
        .ok()
        .and_then(|amount| Price::new(amount).ok())
        .ok_or_else(|| CommandError::InvalidPrice(token.to_string()))
}
