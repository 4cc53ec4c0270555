/// Dot-prefixed commands that act on the session rather than the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Constants,
    Pages,
    Index,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            ".exit" => Some(MetaCommand::Exit),
            ".constants" => Some(MetaCommand::Constants),
            ".pages" => Some(MetaCommand::Pages),
            ".index" => Some(MetaCommand::Index),
            _ => None,
        }
    }
}
