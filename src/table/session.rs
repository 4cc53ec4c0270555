use std::io::Write;

use anyhow::Result;
use itertools::Itertools;
use log::{debug, info};

use super::{
    config::Config,
    error::StoreError,
    index_node::IndexNode,
    meta::MetaCommand,
    page::PAGE_SIZE,
    row::{Row, EMAIL_SIZE, ID_SIZE, ROW_SIZE, USERNAME_SIZE},
    row_store::RowStore,
    statement::{self, Column, Filter, SelectQuery, Selection, Statement},
};

/// What the prompt loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// A row store plus a username index kept in step with it. Index keys are
/// row numbers.
pub struct Session {
    store: RowStore,
    username_index: IndexNode<String, u32>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        info!(
            "opening table: {} rows per page, {} pages, index order {}",
            config.layout.rows_per_page(),
            config.layout.max_pages(),
            config.index_order
        );
        Session {
            store: RowStore::new(config.layout),
            username_index: IndexNode::new(config.index_order),
        }
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn username_index(&self) -> &IndexNode<String, u32> {
        &self.username_index
    }

    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> Result<Control> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Control::Continue);
        }

        if line.starts_with('.') {
            return match MetaCommand::parse(line) {
                Some(command) => self.run_meta(command, out),
                None => {
                    writeln!(out, "Unrecognized command '{}'", line)?;
                    Ok(Control::Continue)
                }
            };
        }

        match statement::prepare(line) {
            Ok(statement) => self.execute(&statement, out)?,
            Err(err) => writeln!(out, "{}", err)?,
        }
        Ok(Control::Continue)
    }

    pub fn run_meta(&self, command: MetaCommand, out: &mut impl Write) -> Result<Control> {
        match command {
            MetaCommand::Exit => return Ok(Control::Exit),
            MetaCommand::Constants => {
                let layout = self.store.layout();
                writeln!(out, "Constants:")?;
                writeln!(out, "ROW_SIZE: {}", ROW_SIZE)?;
                writeln!(out, "ID_SIZE: {}", ID_SIZE)?;
                writeln!(out, "USERNAME_SIZE: {}", USERNAME_SIZE)?;
                writeln!(out, "EMAIL_SIZE: {}", EMAIL_SIZE)?;
                writeln!(out, "PAGE_SIZE: {}", PAGE_SIZE)?;
                writeln!(out, "ROWS_PER_PAGE: {}", layout.rows_per_page())?;
                writeln!(out, "TABLE_MAX_PAGES: {}", layout.max_pages())?;
                writeln!(out, "TABLE_MAX_ROWS: {}", layout.capacity())?;
            }
            MetaCommand::Pages => self.store.pretty_print(out)?,
            MetaCommand::Index => self.username_index.pretty_print(out)?,
        }
        Ok(Control::Continue)
    }

    pub fn execute(&mut self, statement: &Statement, out: &mut impl Write) -> Result<()> {
        match statement {
            Statement::Insert(rows) => {
                for row in rows {
                    if let Err(err) = self.insert(row) {
                        writeln!(out, "{}", err)?;
                        return Ok(());
                    }
                }
            }
            Statement::Select(query) => self.select(query, out)?,
        }
        writeln!(out, "Executed.")?;
        Ok(())
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), StoreError> {
        // TableLayout keeps capacity within u32, so a stored row number fits
        let row_num = self.store.num_rows() as u32;
        self.store.insert(row)?;
        self.username_index
            .insert(row.username().into_owned(), row_num);
        Ok(())
    }

    fn select(&self, query: &SelectQuery, out: &mut impl Write) -> Result<()> {
        let rows = match &query.filter {
            Some(Filter {
                column: Column::Username,
                value,
            }) => {
                debug!("index lookup for username '{}'", value);
                self.username_index
                    .get(value)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|row_num| self.store.get(*row_num as usize))
                    .collect_vec()
            }
            Some(filter) => self
                .store
                .scan()
                .filter(|row| filter.matches(row))
                .collect_vec(),
            None => self.store.scan().collect_vec(),
        };

        match &query.selection {
            Selection::Count => writeln!(out, "{}", rows.len())?,
            Selection::Columns(columns) => {
                for row in rows {
                    let values = columns.iter().map(|c| c.read(row)).join(", ");
                    writeln!(out, "({})", values)?;
                }
            }
        }
        Ok(())
    }
}
