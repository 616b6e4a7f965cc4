//! Command table.

use std::collections::HashMap;
use std::sync::Arc;

use super::args::CommandSchema;
use super::traits::Command;

struct Registered {
    command: Arc<dyn Command>,
    schema: CommandSchema,
}

/// Name → handler table. Filled once at startup, read-only afterwards.
#[derive(Default)]
pub struct CommandTable {
    commands: HashMap<String, Registered>,
}

impl CommandTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding every built-in command.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        super::builtin::register_builtins(&mut table);
        table
    }

    /// Register a command. A later registration under the same name wins.
    pub fn register(&mut self, command: impl Command + 'static) {
        self.register_arc(Arc::new(command));
    }

    /// Register a command that's already in an Arc.
    pub fn register_arc(&mut self, command: Arc<dyn Command>) {
        let schema = command.schema();
        self.commands
            .insert(command.name().to_string(), Registered { command, schema });
    }

    /// Look up a command and its schema.
    pub fn get(&self, name: &str) -> Option<(Arc<dyn Command>, &CommandSchema)> {
        self.commands
            .get(name)
            .map(|r| (Arc::clone(&r.command), &r.schema))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// All command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// All schemas, sorted by name.
    pub fn schemas(&self) -> Vec<&CommandSchema> {
        let mut schemas: Vec<_> = self.commands.values().map(|r| &r.schema).collect();
        schemas.sort_by_key(|s| s.name);
        schemas
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.names())
            .finish()
    }
}
