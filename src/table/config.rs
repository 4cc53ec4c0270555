use anyhow::{bail, Context, Result};

use super::{
    index_node::DEFAULT_INDEX_ORDER,
    layout::TableLayout,
    page::{PAGE_SIZE, TABLE_MAX_PAGES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub layout: TableLayout,
    pub index_order: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            layout: TableLayout::default(),
            index_order: DEFAULT_INDEX_ORDER,
        }
    }
}

impl Config {
    /// Reads `--page-size`, `--max-pages` and `--index-order` from the
    /// arguments following the program name.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut page_size = PAGE_SIZE;
        let mut max_pages = TABLE_MAX_PAGES;
        let mut index_order = DEFAULT_INDEX_ORDER;

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--page-size" => page_size = parse_value(&flag, args.next())?,
                "--max-pages" => max_pages = parse_value(&flag, args.next())?,
                "--index-order" => index_order = parse_value(&flag, args.next())?,
                other => bail!("unrecognized argument: {}", other),
            }
        }
        if index_order < 2 {
            bail!("index order must be at least 2, got {}", index_order);
        }

        Ok(Config {
            layout: TableLayout::for_page_size(page_size, max_pages)?,
            index_order,
        })
    }
}

fn parse_value(flag: &str, value: Option<String>) -> Result<usize> {
    let value = value.with_context(|| format!("missing value for {}", flag))?;
    value
        .parse()
        .with_context(|| format!("invalid value for {}: {}", flag, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row::ROW_SIZE;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(Config::from_args(args(&[])).unwrap(), Config::default());
    }

    #[test]
    fn flags_override_defaults() {
        let page_size = (ROW_SIZE * 2).to_string();
        let config = Config::from_args(args(&[
            "--page-size",
            &page_size,
            "--max-pages",
            "3",
            "--index-order",
            "8",
        ]))
        .unwrap();
        assert_eq!(config.layout, TableLayout::new(2, 3).unwrap());
        assert_eq!(config.index_order, 8);
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(Config::from_args(args(&["--max-pages"])).is_err());
        assert!(Config::from_args(args(&["--max-pages", "many"])).is_err());
        assert!(Config::from_args(args(&["--max-pages", "0"])).is_err());
        assert!(Config::from_args(args(&["--page-size", "8"])).is_err());
        assert!(Config::from_args(args(&["--index-order", "1"])).is_err());
        assert!(Config::from_args(args(&["--verbose"])).is_err());
    }

    #[test]
    fn huge_max_pages_is_an_error() {
        let max = usize::MAX.to_string();
        assert!(Config::from_args(args(&["--max-pages", &max])).is_err());
        assert!(Config::from_args(args(&["--page-size", &max, "--max-pages", "2"])).is_err());
    }
}
