use itertools::Itertools;
use log::debug;
use sqlparser::{
    ast::{
        self, BinaryOperator, Expr, Function, Ident, ObjectName, SelectItem, SetExpr, TableFactor,
        UnaryOperator, Value,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};
use thiserror::Error;

use super::row::{EmbeddedNul, Row};

pub const TABLE_NAME: &str = "users";

static DIALECT: SQLiteDialect = SQLiteDialect {};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse command.")]
    Syntax,
    #[error("Unrecognized command '{0}'")]
    Unrecognized(String),
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String contains a NUL byte.")]
    EmbeddedNul(#[from] EmbeddedNul),
    #[error("Unknown table '{0}'.")]
    UnknownTable(String),
    #[error("Unknown column '{0}'.")]
    UnknownColumn(String),
    #[error("{0} is not currently supported.")]
    Unsupported(String),
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Insert(Vec<Row>),
    Select(SelectQuery),
}

#[derive(Debug, PartialEq)]
pub struct SelectQuery {
    pub selection: Selection,
    pub filter: Option<Filter>,
}

#[derive(Debug, PartialEq)]
pub enum Selection {
    Columns(Vec<Column>),
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Username,
    Email,
}

/// Equality predicate `column = value`, compared on the rendered column text.
#[derive(Debug, PartialEq)]
pub struct Filter {
    pub column: Column,
    pub value: String,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Id, Column::Username, Column::Email];

    pub fn from_name(name: &str) -> Result<Self, PrepareError> {
        match name.to_lowercase().as_str() {
            "id" => Ok(Column::Id),
            "username" => Ok(Column::Username),
            "email" => Ok(Column::Email),
            _ => Err(PrepareError::UnknownColumn(name.to_owned())),
        }
    }

    pub fn read(&self, row: &Row) -> String {
        match self {
            Column::Id => row.id.to_string(),
            Column::Username => row.username().into_owned(),
            Column::Email => row.email().into_owned(),
        }
    }
}

impl Filter {
    pub fn matches(&self, row: &Row) -> bool {
        self.column.read(row) == self.value
    }
}

impl SelectQuery {
    pub fn all() -> Self {
        SelectQuery {
            selection: Selection::Columns(Column::ALL.to_vec()),
            filter: None,
        }
    }
}

/// Turns one input line into a statement. Accepts the shorthand
/// `insert <id> <username> <email>` and `select` forms as well as SQL.
/// Tokens after the email in the shorthand insert are ignored.
pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
    let tokens = input.split_whitespace().collect_vec();
    match tokens.as_slice() {
        ["select"] => return Ok(Statement::Select(SelectQuery::all())),
        ["insert", args @ ..]
            if args
                .first()
                .map_or(true, |t| !t.eq_ignore_ascii_case("into")) =>
        {
            return prepare_insert(args)
        }
        _ => {}
    }

    let ast = match Parser::parse_sql(&DIALECT, input) {
        Ok(ast) => ast,
        Err(err) => {
            debug!("could not parse '{}': {}", input, err);
            let keyword = tokens.first().map(|t| t.to_lowercase());
            return Err(match keyword.as_deref() {
                Some("insert") | Some("select") => PrepareError::Syntax,
                _ => PrepareError::Unrecognized(input.to_owned()),
            });
        }
    };
    match ast.as_slice() {
        [statement] => statement.try_into(),
        [] => Err(PrepareError::Unrecognized(input.to_owned())),
        _ => Err(PrepareError::Unsupported("multiple statements".to_owned())),
    }
}

fn prepare_insert(args: &[&str]) -> Result<Statement, PrepareError> {
    let [id, username, email, ..] = args else {
        return Err(PrepareError::Syntax);
    };
    let row = Row::new(parse_id(id)?, username, email)?;
    Ok(Statement::Insert(vec![row]))
}

fn parse_id(text: &str) -> Result<u32, PrepareError> {
    let id: i64 = text.parse().map_err(|_| PrepareError::Syntax)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    u32::try_from(id).map_err(|_| PrepareError::Syntax)
}

impl TryFrom<&ast::Statement> for Statement {
    type Error = PrepareError;

    fn try_from(value: &ast::Statement) -> Result<Self, Self::Error> {
        match value {
            ast::Statement::Insert {
                table_name,
                columns,
                source,
                ..
            } => {
                check_table(table_name)?;
                let columns: Vec<Column> = if columns.is_empty() {
                    Column::ALL.to_vec()
                } else {
                    columns
                        .iter()
                        .map(|c| Column::from_name(&c.value))
                        .try_collect()?
                };
                if columns.len() != Column::ALL.len() || !columns.iter().all_unique() {
                    return Err(PrepareError::Syntax);
                }
                let SetExpr::Values(values) = source.body.as_ref() else {
                    return Err(PrepareError::Unsupported(source.body.to_string()));
                };
                let rows = values
                    .rows
                    .iter()
                    .map(|exprs| row_from_exprs(&columns, exprs))
                    .try_collect()?;
                Ok(Statement::Insert(rows))
            }
            ast::Statement::Query(query) => Ok(Statement::Select(query.as_ref().try_into()?)),
            s => Err(PrepareError::Unsupported(s.to_string())),
        }
    }
}

impl TryFrom<&ast::Query> for SelectQuery {
    type Error = PrepareError;

    fn try_from(value: &ast::Query) -> Result<Self, Self::Error> {
        let SetExpr::Select(select) = value.body.as_ref() else {
            return Err(PrepareError::Unsupported(value.body.to_string()));
        };

        match select.from.as_slice() {
            [source] if source.joins.is_empty() => match &source.relation {
                TableFactor::Table { name, .. } => check_table(name)?,
                t => return Err(PrepareError::Unsupported(t.to_string())),
            },
            [] => return Err(PrepareError::Syntax),
            _ => return Err(PrepareError::Unsupported("multiple sources".to_owned())),
        }

        let selection = match select.projection.as_slice() {
            [SelectItem::Wildcard(_)] => Selection::Columns(Column::ALL.to_vec()),
            [SelectItem::UnnamedExpr(Expr::Function(Function { name, .. }))] => {
                match name.0.as_slice() {
                    [ident] if ident.value.eq_ignore_ascii_case("count") => Selection::Count,
                    _ => return Err(PrepareError::Unsupported(name.to_string())),
                }
            }
            items => Selection::Columns(
                items
                    .iter()
                    .map(|item| match item {
                        SelectItem::UnnamedExpr(Expr::Identifier(Ident { value, .. })) => {
                            Column::from_name(value)
                        }
                        i => Err(PrepareError::Unsupported(i.to_string())),
                    })
                    .try_collect()?,
            ),
        };

        let filter = select.selection.as_ref().map(filter_from_expr).transpose()?;

        Ok(SelectQuery { selection, filter })
    }
}

fn check_table(name: &ObjectName) -> Result<(), PrepareError> {
    match name.0.as_slice() {
        [ident] if ident.value.eq_ignore_ascii_case(TABLE_NAME) => Ok(()),
        _ => Err(PrepareError::UnknownTable(name.to_string())),
    }
}

fn filter_from_expr(expr: &Expr) -> Result<Filter, PrepareError> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => match left.as_ref() {
            Expr::Identifier(ident) => Ok(Filter {
                column: Column::from_name(&ident.value)?,
                value: literal(right)?,
            }),
            e => Err(PrepareError::Unsupported(e.to_string())),
        },
        e => Err(PrepareError::Unsupported(e.to_string())),
    }
}

fn row_from_exprs(columns: &[Column], exprs: &[Expr]) -> Result<Row, PrepareError> {
    if exprs.len() != columns.len() {
        return Err(PrepareError::Syntax);
    }
    let (mut id, mut username, mut email) = (None, String::new(), String::new());
    for (column, expr) in columns.iter().zip(exprs) {
        let text = literal(expr)?;
        match column {
            Column::Id => id = Some(parse_id(&text)?),
            Column::Username => username = text,
            Column::Email => email = text,
        }
    }
    let id = id.ok_or(PrepareError::Syntax)?;
    Ok(Row::new(id, &username, &email)?)
}

fn literal(expr: &Expr) -> Result<String, PrepareError> {
    match expr {
        Expr::Value(Value::Number(n, _)) => Ok(n.to_owned()),
        Expr::Value(Value::SingleQuotedString(s)) => Ok(s.to_owned()),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match expr.as_ref() {
            Expr::Value(Value::Number(n, _)) => Ok(format!("-{}", n)),
            e => Err(PrepareError::Unsupported(e.to_string())),
        },
        e => Err(PrepareError::Unsupported(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32, username: &str, email: &str) -> Row {
        Row::new(id, username, email).unwrap()
    }

    #[test]
    fn shorthand_insert() {
        assert_eq!(
            prepare("insert 1 alice alice@example.com"),
            Ok(Statement::Insert(vec![row(1, "alice", "alice@example.com")]))
        );
    }

    #[test]
    fn shorthand_insert_errors() {
        assert_eq!(prepare("insert 1 alice"), Err(PrepareError::Syntax));
        assert_eq!(prepare("insert"), Err(PrepareError::Syntax));
        assert_eq!(prepare("insert x alice a@b"), Err(PrepareError::Syntax));
        assert_eq!(prepare("insert -1 alice a@b"), Err(PrepareError::NegativeId));
        assert_eq!(
            prepare("insert 1 a\0b a@b"),
            Err(PrepareError::EmbeddedNul(EmbeddedNul { field: "username" }))
        );
    }

    #[test]
    fn shorthand_insert_ignores_trailing_tokens() {
        assert_eq!(
            prepare("insert 1 alice alice@example.com extra words"),
            Ok(Statement::Insert(vec![row(1, "alice", "alice@example.com")]))
        );
    }

    #[test]
    fn shorthand_insert_truncates_long_text() {
        let Ok(Statement::Insert(rows)) = prepare(&format!("insert 1 {} a@b", "u".repeat(40)))
        else {
            panic!("expected an insert");
        };
        assert_eq!(rows[0].username(), "u".repeat(32));
        assert_eq!(rows[0].email(), "a@b");
    }

    #[test]
    fn bare_select_reads_everything() {
        assert_eq!(prepare("select"), Ok(Statement::Select(SelectQuery::all())));
    }

    #[test]
    fn sql_insert_with_and_without_columns() {
        assert_eq!(
            prepare("INSERT INTO users VALUES (1, 'alice', 'a@x'), (2, 'bob', 'b@x')"),
            Ok(Statement::Insert(vec![row(1, "alice", "a@x"), row(2, "bob", "b@x")]))
        );
        assert_eq!(
            prepare("insert into users (email, id, username) values ('c@x', 3, 'carol')"),
            Ok(Statement::Insert(vec![row(3, "carol", "c@x")]))
        );
    }

    #[test]
    fn sql_insert_errors() {
        assert_eq!(
            prepare("INSERT INTO users VALUES (-4, 'a', 'b')"),
            Err(PrepareError::NegativeId)
        );
        assert_eq!(
            prepare("INSERT INTO users VALUES (1, 'a')"),
            Err(PrepareError::Syntax)
        );
        assert_eq!(
            prepare("INSERT INTO users (id, id, email) VALUES (1, 2, 'b')"),
            Err(PrepareError::Syntax)
        );
        assert_eq!(
            prepare("INSERT INTO people VALUES (1, 'a', 'b')"),
            Err(PrepareError::UnknownTable("people".to_owned()))
        );
    }

    #[test]
    fn sql_select_forms() {
        assert_eq!(
            prepare("SELECT * FROM users"),
            Ok(Statement::Select(SelectQuery::all()))
        );
        assert_eq!(
            prepare("select email, id from users"),
            Ok(Statement::Select(SelectQuery {
                selection: Selection::Columns(vec![Column::Email, Column::Id]),
                filter: None,
            }))
        );
        assert_eq!(
            prepare("SELECT count(*) FROM users WHERE username = 'alice'"),
            Ok(Statement::Select(SelectQuery {
                selection: Selection::Count,
                filter: Some(Filter {
                    column: Column::Username,
                    value: "alice".to_owned(),
                }),
            }))
        );
        assert_eq!(
            prepare("SELECT * FROM users WHERE id = 7"),
            Ok(Statement::Select(SelectQuery {
                selection: Selection::Columns(Column::ALL.to_vec()),
                filter: Some(Filter {
                    column: Column::Id,
                    value: "7".to_owned(),
                }),
            }))
        );
    }

    #[test]
    fn select_errors() {
        assert_eq!(
            prepare("SELECT name FROM users"),
            Err(PrepareError::UnknownColumn("name".to_owned()))
        );
        assert_eq!(prepare("select from"), Err(PrepareError::Syntax));
        assert!(matches!(
            prepare("SELECT * FROM users WHERE id > 3"),
            Err(PrepareError::Unsupported(_))
        ));
    }

    #[test]
    fn unknown_statements() {
        assert_eq!(
            prepare("frobnicate"),
            Err(PrepareError::Unrecognized("frobnicate".to_owned()))
        );
        assert!(matches!(
            prepare("DELETE FROM users"),
            Err(PrepareError::Unsupported(_))
        ));
    }
}
