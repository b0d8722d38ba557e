use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::{TempDir, tempdir};

use strata::{
    Session, StrataError,
    model::{ConnectDirection, EntityType, RelationshipType},
    shape::EntityShape,
};
use strata_cli::{Args, Command, EntityCommand, RelationCommand, TemplateCommand, run};

/// A structure file and a file-store config inside one temporary directory.
struct Workspace {
    dir: TempDir,
    file: PathBuf,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp directory");
        let file = dir.path().join("structure.json");
        let config = dir.path().join("config.toml");
        let store = dir.path().join("store");
        fs::write(
            &config,
            format!(
                "[store]\nbackend = \"file\"\npath = {:?}\n",
                store.to_string_lossy()
            ),
        )
        .unwrap();
        Self { dir, file, config }
    }

    fn args(&self, command: Command) -> Args {
        Args {
            command,
            file: self.file.to_string_lossy().to_string(),
            config: Some(self.config.to_string_lossy().to_string()),
            log_level: "off".to_string(),
        }
    }

    fn run(&self, command: Command) -> Result<(), StrataError> {
        run(&self.args(command))
    }

    fn session(&self) -> Session {
        serde_json::from_str(&fs::read_to_string(&self.file).unwrap()).unwrap()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn output(path: &Path) -> Option<String> {
    Some(path.to_string_lossy().to_string())
}

#[test]
fn e2e_smoke_test_edit_and_render() {
    let ws = Workspace::new();

    ws.run(Command::New {
        name: Some("Smoke Test".to_string()),
    })
    .unwrap();
    ws.run(Command::Template(TemplateCommand::Apply {
        slug: "hk-offshore".to_string(),
    }))
    .unwrap();
    let template_entities = ws.session().diagram().entities().len();

    ws.run(Command::Entity(EntityCommand::Add {
        entity_type: EntityType::Individual,
        shape: EntityShape::Circle,
        name: Some("Founder".to_string()),
        x: Some(-50.0),
        y: Some(0.0),
    }))
    .unwrap();

    let session = ws.session();
    assert_eq!(session.name(), "Smoke Test");
    assert_eq!(session.diagram().entities().len(), template_entities + 1);
    let founder = session
        .diagram()
        .entities()
        .iter()
        .find(|entity| entity.name == "Founder")
        .expect("Founder should exist")
        .id()
        .to_string();
    let targets: Vec<String> = session
        .diagram()
        .entities()
        .iter()
        .filter(|entity| entity.id() != founder)
        .map(|entity| entity.id().to_string())
        .collect();

    ws.run(Command::Connect {
        pivot: founder.clone(),
        targets: targets.clone(),
        direction: ConnectDirection::PivotToTargets,
    })
    .unwrap();
    ws.run(Command::Relation(RelationCommand::Flow {
        from: targets[0].clone(),
        to: founder.clone(),
        relationship_type: RelationshipType::Dividend,
    }))
    .unwrap();

    let svg_path = ws.path("structure.svg");
    let png_path = ws.path("structure.png");
    ws.run(Command::Render {
        output: output(&svg_path),
    })
    .unwrap();
    ws.run(Command::Render {
        output: output(&png_path),
    })
    .unwrap();

    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Founder"));
    assert_eq!(&fs::read(&png_path).unwrap()[1..4], b"PNG");

    ws.run(Command::Entity(EntityCommand::Remove { id: founder.clone() }))
        .unwrap();
    let session = ws.session();
    assert!(
        session
            .diagram()
            .relationships()
            .iter()
            .all(|rel| rel.from_id != founder && rel.to_id != founder)
    );
}

#[test]
fn e2e_smoke_test_store_round_trip() {
    let ws = Workspace::new();

    ws.run(Command::New { name: None }).unwrap();
    ws.run(Command::Template(TemplateCommand::Apply {
        slug: "double-irish".to_string(),
    }))
    .unwrap();
    let saved = ws.session();

    ws.run(Command::Save).unwrap();
    ws.run(Command::New { name: None }).unwrap();
    assert!(ws.session().diagram().is_empty());

    let share_url = saved.share_url("http://localhost:3000").unwrap();
    ws.run(Command::Open { target: share_url }).unwrap();
    assert_eq!(ws.session(), saved);

    ws.run(Command::Delete {
        id: saved.id().to_string(),
    })
    .unwrap();
    ws.run(Command::New { name: None }).unwrap();
    let fresh = ws.session();
    ws.run(Command::Open {
        target: saved.id().to_string(),
    })
    .unwrap();
    assert_eq!(ws.session(), fresh, "opening a deleted id changes nothing");
}

#[test]
fn e2e_smoke_test_errors() {
    let ws = Workspace::new();

    assert!(matches!(ws.run(Command::Route), Err(StrataError::Io(_))));

    ws.run(Command::New { name: None }).unwrap();
    assert!(matches!(
        ws.run(Command::Template(TemplateCommand::Apply {
            slug: "nope".to_string(),
        })),
        Err(StrataError::UnknownTemplate(_))
    ));
    assert!(matches!(
        ws.run(Command::Entity(EntityCommand::Update {
            id: "x".to_string(),
            patch: "{not json".to_string(),
        })),
        Err(StrataError::Json(_))
    ));
}
