//! Command-line argument definitions for the Strata CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Every subcommand edits a structure file (`--file`) or
//! talks to the configured store.

use clap::{Parser, Subcommand};

use strata::{
    model::{ConnectDirection, EntityType, LineType, RelationshipType},
    shape::EntityShape,
};

/// Command-line arguments for the Strata ownership diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the structure file being edited
    #[arg(short, long, global = true, default_value = "structure.json")]
    pub file: String,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new, empty structure
    New {
        /// Name of the structure
        #[arg(long)]
        name: Option<String>,
    },

    /// Rename the structure
    Rename { name: String },

    /// Built-in templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Entity editing
    #[command(subcommand)]
    Entity(EntityCommand),

    /// Relationship editing
    #[command(subcommand)]
    Relation(RelationCommand),

    /// Connect one entity with many others at 100% equity
    Connect {
        pivot: String,

        #[arg(required = true)]
        targets: Vec<String>,

        /// one-to-many (pivot owns targets) or many-to-one
        #[arg(long, default_value = "one-to-many")]
        direction: ConnectDirection,
    },

    /// Print the routed connector geometry as JSON
    Route,

    /// Render the structure to SVG or PNG, chosen by the output extension
    Render {
        /// Output path, `<name>_Diagram.png` when omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Save the structure to the store
    Save,

    /// Load a structure from the store by id or share URL
    Open { target: String },

    /// List stored structures
    List,

    /// Delete a stored structure
    Delete { id: String },

    /// Print the share URL of the structure
    Share,

    /// Run the AI tax analysis and write the text report
    Analyze {
        /// Output path, `<name>_Analysis.txt` when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List the built-in templates
    List,

    /// Replace the diagram with a template
    Apply { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// Add an entity at a random or given position
    Add {
        #[arg(long = "type")]
        entity_type: EntityType,

        #[arg(long, default_value = "rectangle")]
        shape: EntityShape,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, requires = "y", allow_negative_numbers = true)]
        x: Option<f32>,

        #[arg(long, requires = "x", allow_negative_numbers = true)]
        y: Option<f32>,
    },

    /// Merge a JSON patch (camelCase fields) into an entity
    Update { id: String, patch: String },

    /// Move an entity
    Move {
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f32,

        #[arg(allow_negative_numbers = true)]
        y: f32,
    },

    /// Remove an entity and every relationship touching it
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum RelationCommand {
    /// Add a relationship
    Add {
        from: String,
        to: String,

        #[arg(long = "type")]
        relationship_type: RelationshipType,

        /// Defaults to the type name
        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        percentage: Option<f64>,

        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        line_type: Option<LineType>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Add an income flow with its preset label and colour
    Flow {
        from: String,
        to: String,

        #[arg(long = "type")]
        relationship_type: RelationshipType,
    },

    /// Merge a JSON patch (camelCase fields) into a relationship
    Update { id: String, patch: String },

    /// Remove a relationship
    Remove { id: String },
}
