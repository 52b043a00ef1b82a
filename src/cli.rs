use crate::config::{Config, load_config};
use crate::ir::{FamilyGraph, FamilyTree, Gender, PersonData};
use crate::kinship::{full_name, person_role, sort_by_role};
use crate::layout::{LayoutMode, LayoutRequest, compute_layout};
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::mutation::{
    MutationContext, PersonLink, add_person, add_relationship, delete_person, edit_person,
};
use crate::parser::parse_family;
use crate::render::{render_svg, write_output_svg};
use crate::store::{JsonDirStore, TreeRepository};
use anyhow::{Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ftree", version, about = "Genealogical family tree layout and rendering")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lay out a tree and write SVG, PNG or the JSON layout dump
    Layout(LayoutArgs),
    /// Add a person, optionally linked as parent or child of someone
    Add(AddArgs),
    /// Replace a person's fields
    Edit(EditArgs),
    /// Delete a person together with all of their ancestors
    Delete(DeleteArgs),
    /// Link two existing persons as parent and child
    Link(LinkArgs),
    /// List everyone's kinship role relative to the main person
    Roles(RolesArgs),
    /// List (or create) trees in a store visible to an identity
    Trees(TreesArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SourceArgs {
    /// Graph or tree JSON/JSON5 file, or '-' for stdin
    #[arg(short = 'i', long = "input", conflicts_with = "store")]
    pub input: Option<PathBuf>,

    /// Directory of stored trees (one JSON file per tree)
    #[arg(long = "store", requires = "tree")]
    pub store: Option<PathBuf>,

    /// Tree id inside --store
    #[arg(long = "tree")]
    pub tree: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ViewArgs {
    #[arg(short = 'm', long = "mode", value_enum, default_value = "ancestors")]
    pub mode: ModeArg,

    /// Person to center the tree on
    #[arg(short = 'r', long = "root")]
    pub root: Option<String>,

    /// Identity key (email) of the viewer, used to find the root
    #[arg(long = "identity")]
    pub identity: Option<String>,
}

impl ViewArgs {
    fn request(&self) -> LayoutRequest {
        LayoutRequest {
            mode: self.mode.into(),
            root_id: self.root.clone(),
            identity_hint: self.identity.clone(),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct PersonFields {
    #[arg(long = "first-name", default_value = "")]
    pub first_name: String,
    #[arg(long = "last-name", default_value = "")]
    pub last_name: String,
    #[arg(long = "middle-name")]
    pub middle_name: Option<String>,
    #[arg(long = "gender", value_enum)]
    pub gender: Option<GenderArg>,
    #[arg(long = "birth-date")]
    pub birth_date: Option<String>,
    #[arg(long = "death-date")]
    pub death_date: Option<String>,
    #[arg(long = "email")]
    pub email: Option<String>,
}

impl PersonFields {
    fn into_data(self) -> PersonData {
        PersonData {
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            birth_date: self.birth_date,
            death_date: self.death_date,
            gender: self.gender.map(Gender::from),
            email: self.email,
            ..PersonData::default()
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct MutationOutput {
    /// Where to write the updated document (stdout if omitted). Ignored
    /// with --store, which saves in place.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewArgs,
    #[command(flatten)]
    pub person: PersonFields,
    /// The new person becomes a parent of this id
    #[arg(long = "parent-of", conflicts_with = "child_of")]
    pub parent_of: Option<String>,
    /// The new person becomes a child of this id
    #[arg(long = "child-of")]
    pub child_of: Option<String>,
    #[command(flatten)]
    pub out: MutationOutput,
}

#[derive(ClapArgs, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Id of the person to edit
    pub id: String,
    #[command(flatten)]
    pub person: PersonFields,
    #[command(flatten)]
    pub out: MutationOutput,
}

#[derive(ClapArgs, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Id of the person to delete
    pub id: String,
    #[command(flatten)]
    pub out: MutationOutput,
}

#[derive(ClapArgs, Debug)]
pub struct LinkArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewArgs,
    #[arg(long = "parent")]
    pub parent: String,
    #[arg(long = "child")]
    pub child: String,
    #[command(flatten)]
    pub out: MutationOutput,
}

#[derive(ClapArgs, Debug)]
pub struct RolesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(ClapArgs, Debug)]
pub struct TreesArgs {
    #[arg(long = "store")]
    pub store: PathBuf,
    /// Identity (email) whose trees to list
    #[arg(long = "identity")]
    pub identity: String,
    /// Create an empty tree with this name, owned by the identity
    #[arg(long = "new")]
    pub new: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Ancestors,
    Descendants,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ancestors => LayoutMode::Ancestors,
            ModeArg::Descendants => LayoutMode::Descendants,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderArg {
    Male,
    Female,
    Other,
}

impl From<GenderArg> for Gender {
    fn from(gender: GenderArg) -> Self {
        match gender {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Other => Gender::Other,
        }
    }
}

/// A loaded document and where it came from, so edits can be written back.
enum Loaded {
    Document {
        graph: FamilyGraph,
        tree: Option<FamilyTree>,
    },
    Stored {
        store: JsonDirStore,
        tree: FamilyTree,
    },
}

impl Loaded {
    fn graph(&self) -> &FamilyGraph {
        match self {
            Loaded::Document { graph, .. } => graph,
            Loaded::Stored { tree, .. } => &tree.data,
        }
    }

    fn write_back(self, graph: FamilyGraph, output: Option<&Path>) -> Result<()> {
        match self {
            Loaded::Stored { store, mut tree } => {
                tree.data = graph;
                store.save(&tree)?;
                eprintln!("saved tree {} in {}", tree.id, store.root().display());
                Ok(())
            }
            Loaded::Document { tree: Some(mut tree), .. } => {
                tree.data = graph;
                emit_json(&serde_json::to_string_pretty(&tree)?, output)
            }
            Loaded::Document { tree: None, .. } => emit_json(&serde_json::to_string_pretty(&graph)?, output),
        }
    }
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    match args.command {
        Command::Layout(args) => run_layout(args),
        Command::Add(args) => run_add(args),
        Command::Edit(args) => {
            let loaded = load_source(&args.source)?;
            let graph = edit_person(loaded.graph(), &args.id, args.person.into_data())?;
            loaded.write_back(graph, args.out.output.as_deref())
        }
        Command::Delete(args) => {
            let loaded = load_source(&args.source)?;
            let graph = delete_person(loaded.graph(), &args.id)?;
            loaded.write_back(graph, args.out.output.as_deref())
        }
        Command::Link(args) => {
            let loaded = load_source(&args.source)?;
            let ctx = mutation_context(loaded.graph(), &args.view)?;
            let linked = add_relationship(loaded.graph(), &args.parent, &args.child, &ctx)?;
            eprintln!("added relationship {}", linked.relationship_id);
            loaded.write_back(linked.graph, args.out.output.as_deref())
        }
        Command::Roles(args) => run_roles(args),
        Command::Trees(args) => run_trees(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn run_layout(args: LayoutArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let loaded = load_source(&args.source)?;
    let graph = loaded.graph();
    let layout = compute_layout(graph, &args.view.request(), &config.layout)?;

    match args.output_format {
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout, graph)?,
            None => println!("{}", layout_dump_json(&layout, graph)?),
        },
        OutputFormat::Svg => {
            let svg = render_svg(&layout, graph, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&layout, graph, &config, args.output.as_deref())?,
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(
    layout: &crate::layout::Layout,
    graph: &FamilyGraph,
    config: &Config,
    output: Option<&Path>,
) -> Result<()> {
    let output = output.ok_or_else(|| anyhow!("Output path required for png output"))?;
    let svg = render_svg(layout, graph, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(
    _layout: &crate::layout::Layout,
    _graph: &FamilyGraph,
    _config: &Config,
    _output: Option<&Path>,
) -> Result<()> {
    Err(anyhow!("PNG output requires the `png` feature"))
}

fn run_add(args: AddArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let link = match (args.parent_of, args.child_of) {
        (Some(child), _) => Some(PersonLink::ParentOf(child)),
        (None, Some(parent)) => Some(PersonLink::ChildOf(parent)),
        (None, None) => None,
    };
    let ctx = mutation_context(loaded.graph(), &args.view)?;
    let added = add_person(loaded.graph(), args.person.into_data(), link, &ctx)?;
    eprintln!("added person {}", added.person_id);
    loaded.write_back(added.graph, args.out.output.as_deref())
}

fn run_roles(args: RolesArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let graph = loaded.graph();
    let main = crate::layout::resolve_root(
        &graph.persons,
        &graph.relationships,
        args.view.identity.as_deref(),
        args.view.root.as_deref(),
    )?;
    let mut members: Vec<_> = graph
        .persons
        .iter()
        .map(|person| (person, person_role(graph, &person.id, &main)))
        .collect();
    sort_by_role(&mut members);
    for (person, role) in members {
        println!("{}\t{}\t{}", person.id, full_name(person), role);
    }
    Ok(())
}

fn run_trees(args: TreesArgs) -> Result<()> {
    let store = JsonDirStore::open(&args.store)?;
    if let Some(name) = args.new {
        let tree = store.create(Some(name), &args.identity, FamilyGraph::new())?;
        eprintln!("created tree {}", tree.id);
    }
    for summary in store.list_for(&args.identity)? {
        println!(
            "{}\t{}\t{:?}\t{} persons",
            summary.id, summary.name, summary.role, summary.persons
        );
    }
    Ok(())
}

/// Root of the view an edit is made from; resolved like a layout would.
fn mutation_context(graph: &FamilyGraph, view: &ViewArgs) -> Result<MutationContext> {
    let root_id = if graph.is_empty() {
        None
    } else {
        Some(crate::layout::resolve_root(
            &graph.persons,
            &graph.relationships,
            view.identity.as_deref(),
            view.root.as_deref(),
        )?)
    };
    Ok(MutationContext {
        root_id,
        mode: view.mode.into(),
    })
}

fn load_source(source: &SourceArgs) -> Result<Loaded> {
    if let (Some(dir), Some(id)) = (&source.store, &source.tree) {
        let store = JsonDirStore::open(dir)?;
        let tree = store.load(id)?;
        return Ok(Loaded::Stored { store, tree });
    }
    let input = read_input(source.input.as_deref())?;
    let parsed = parse_family(&input)?;
    Ok(Loaded::Document {
        graph: parsed.graph,
        tree: parsed.tree,
    })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn emit_json(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_layout_flags() {
        let args = Args::try_parse_from([
            "ftree", "layout", "-i", "tree.json", "-e", "json", "--mode", "descendants", "--root", "p1",
        ])
        .unwrap();
        let Command::Layout(layout) = args.command else {
            panic!("expected layout subcommand");
        };
        assert!(matches!(layout.output_format, OutputFormat::Json));
        let request = layout.view.request();
        assert_eq!(request.mode, LayoutMode::Descendants);
        assert_eq!(request.root_id.as_deref(), Some("p1"));
    }

    #[test]
    fn add_rejects_both_link_directions() {
        let result = Args::try_parse_from([
            "ftree", "add", "--first-name", "A", "--parent-of", "x", "--child-of", "y",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn store_requires_tree_id() {
        assert!(Args::try_parse_from(["ftree", "roles", "--store", "dir"]).is_err());
    }
}
