//! CLI logic for the Strata ownership diagram tool.
//!
//! Each invocation loads the session stored in the structure file, applies
//! one command and writes the session back. Store commands go through the
//! backend selected by the configuration.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, EntityCommand, RelationCommand, TemplateCommand};

use std::{fs, path::Path};

use log::{debug, info, warn};

use strata::{
    DiagramRenderer, Session, StrataError,
    analysis::Analyzer,
    config::AppConfig,
    geometry::Point,
    model::{EntityPatch, RelationshipExtras, RelationshipPatch},
    open_store,
    templates::{BUILTIN_TEMPLATES, find_template},
};

/// Run the Strata CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `StrataError` for:
/// - File I/O errors, including a missing structure file
/// - Configuration loading errors
/// - Malformed JSON patches or structure files
/// - Store, analysis and export errors
pub fn run(args: &Args) -> Result<(), StrataError> {
    info!(file = args.file; "Processing structure");

    let app_config = config::load_config(args.config.as_ref())?;
    let file = Path::new(&args.file);

    match &args.command {
        Command::New { name } => {
            let mut session = Session::new();
            if let Some(name) = name {
                session.set_name(name.clone());
            }
            write_session(file, &session)?;
            println!("{}", session.id());
        }
        Command::Rename { name } => {
            edit_session(file, |session| {
                session.set_name(name.clone());
                Ok(())
            })?;
        }
        Command::Template(command) => run_template(file, command)?,
        Command::Entity(command) => run_entity(file, command)?,
        Command::Relation(command) => run_relation(file, command)?,
        Command::Connect {
            pivot,
            targets,
            direction,
        } => {
            let created =
                edit_session(file, |session| Ok(session.batch_connect(pivot, targets, *direction)))?;
            for id in created {
                println!("{id}");
            }
        }
        Command::Route => {
            let session = read_session(file)?;
            let routes = DiagramRenderer::new(app_config).route(session.diagram());
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        Command::Render { output } => {
            let session = read_session(file)?;
            let output = output.clone().unwrap_or_else(|| session.diagram_file_name());
            render(app_config, &session, &output)?;
        }
        Command::Save => {
            let session = read_session(file)?;
            let store = open_store(&app_config)?;
            session.save(store.as_ref())?;
            println!("{}", session.id());
        }
        Command::Open { target } => {
            let id = Session::id_from_share_url(target).unwrap_or_else(|| target.clone());
            let store = open_store(&app_config)?;
            match Session::open(store.as_ref(), &id)? {
                Some(session) => write_session(file, &session)?,
                None => warn!(id; "No stored structure with this id, nothing opened"),
            }
        }
        Command::List => {
            let store = open_store(&app_config)?;
            for summary in store.list()? {
                println!(
                    "{}  {}  {}",
                    summary.id,
                    summary.updated_at.to_rfc3339(),
                    summary.name
                );
            }
        }
        Command::Delete { id } => {
            let store = open_store(&app_config)?;
            store.delete(id)?;
        }
        Command::Share => {
            let session = read_session(file)?;
            println!("{}", session.share_url(app_config.share().base_url())?);
        }
        Command::Analyze { output } => {
            let session = read_session(file)?;
            let analyzer = Analyzer::from_config(app_config.analysis())?;
            let report = session.analyze(&analyzer)?;

            let output = output.clone().unwrap_or_else(|| session.analysis_file_name());
            fs::write(&output, session.report_text(&report))?;
            info!(output_file = output; "Analysis report written");
        }
    }

    Ok(())
}

fn run_template(file: &Path, command: &TemplateCommand) -> Result<(), StrataError> {
    match command {
        TemplateCommand::List => {
            for template in &BUILTIN_TEMPLATES {
                println!("{:<18} {}", template.slug(), template.title());
            }
        }
        TemplateCommand::Apply { slug } => {
            let template =
                find_template(slug).ok_or_else(|| StrataError::UnknownTemplate(slug.clone()))?;
            edit_session(file, |session| session.apply_template(template))?;
        }
    }
    Ok(())
}

fn run_entity(file: &Path, command: &EntityCommand) -> Result<(), StrataError> {
    match command {
        EntityCommand::Add {
            entity_type,
            shape,
            name,
            x,
            y,
        } => {
            let id = edit_session(file, |session| {
                let diagram = session.diagram_mut();
                let id = match (x, y) {
                    (Some(x), Some(y)) => diagram.add_entity_at(*entity_type, *shape, Point::new(*x, *y)),
                    _ => diagram.add_entity(*entity_type, *shape),
                }
                .id()
                .to_string();

                if let Some(name) = name {
                    let patch = EntityPatch {
                        name: Some(name.clone()),
                        ..EntityPatch::default()
                    };
                    diagram.update_entity(&id, patch);
                }
                Ok(id)
            })?;
            println!("{id}");
        }
        EntityCommand::Update { id, patch } => {
            let patch: EntityPatch = serde_json::from_str(patch)?;
            edit_session(file, |session| {
                session.diagram_mut().update_entity(id, patch);
                Ok(())
            })?;
        }
        EntityCommand::Move { id, x, y } => {
            edit_session(file, |session| {
                session.diagram_mut().move_entity(id, Point::new(*x, *y));
                Ok(())
            })?;
        }
        EntityCommand::Remove { id } => {
            edit_session(file, |session| {
                session.diagram_mut().delete_entity(id);
                Ok(())
            })?;
        }
    }
    Ok(())
}

fn run_relation(file: &Path, command: &RelationCommand) -> Result<(), StrataError> {
    match command {
        RelationCommand::Add {
            from,
            to,
            relationship_type,
            label,
            percentage,
            amount,
            color,
            line_type,
            notes,
        } => {
            let label = label
                .clone()
                .unwrap_or_else(|| relationship_type.default_label());
            let extras = RelationshipExtras {
                percentage: *percentage,
                amount: amount.clone(),
                color: color.clone(),
                line_type: *line_type,
                notes: notes.clone(),
            };
            let id = edit_session(file, |session| {
                Ok(session
                    .diagram_mut()
                    .add_relationship(from, to, *relationship_type, label, extras)
                    .id()
                    .to_string())
            })?;
            println!("{id}");
        }
        RelationCommand::Flow {
            from,
            to,
            relationship_type,
        } => {
            let id = edit_session(file, |session| {
                Ok(session
                    .diagram_mut()
                    .add_income_flow(from, to, *relationship_type)
                    .id()
                    .to_string())
            })?;
            println!("{id}");
        }
        RelationCommand::Update { id, patch } => {
            let patch: RelationshipPatch = serde_json::from_str(patch)?;
            edit_session(file, |session| {
                session.diagram_mut().update_relationship(id, patch);
                Ok(())
            })?;
        }
        RelationCommand::Remove { id } => {
            edit_session(file, |session| {
                session.diagram_mut().delete_relationship(id);
                Ok(())
            })?;
        }
    }
    Ok(())
}

fn render(app_config: AppConfig, session: &Session, output: &str) -> Result<(), StrataError> {
    let renderer = DiagramRenderer::new(app_config);
    let is_svg = Path::new(output)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        fs::write(output, renderer.render_svg(session.diagram())?)?;
    } else {
        fs::write(output, renderer.render_png(session.diagram())?)?;
    }

    info!(output_file = output, svg = is_svg; "Diagram exported successfully");
    Ok(())
}

fn read_session(file: &Path) -> Result<Session, StrataError> {
    let content = fs::read_to_string(file)?;
    let session: Session = serde_json::from_str(&content)?;
    debug!(
        id = session.id(),
        entities = session.diagram().entities().len();
        "Structure file loaded"
    );
    Ok(session)
}

fn write_session(file: &Path, session: &Session) -> Result<(), StrataError> {
    fs::write(file, serde_json::to_string_pretty(session)?)?;
    debug!(path = file.display().to_string(); "Structure file written");
    Ok(())
}

fn edit_session<T>(
    file: &Path,
    edit: impl FnOnce(&mut Session) -> Result<T, StrataError>,
) -> Result<T, StrataError> {
    let mut session = read_session(file)?;
    let result = edit(&mut session)?;
    write_session(file, &session)?;
    Ok(result)
}
