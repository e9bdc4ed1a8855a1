//! Abaqus input-file (`.inp`) mesh reader.
//!
//! # Supported keywords
//! - `*Part` / `*End Part`, `*Assembly` / `*End Assembly`,
//!   `*Instance` / `*End Instance` (`part=` copies the part mesh).
//! - `*Node` (2D or 3D coordinates) and `*Element, type=..., [elset=...]`,
//!   with data lines continued by a trailing comma.
//! - `*Nset` / `*Elset` with plain labels, `generate` ranges, references to
//!   earlier sets of the same scope, `instance=` and `INSTANCE.label` members.
//!
//! Names are upper-cased, as result databases store them. Part-level sets
//! appear once per instance as `<INSTANCE>.<SET>`. Without an `*Assembly`
//! every part is exposed as an instance of the same name, and a mesh given
//! outside any part becomes instance `PART-1-1`.
//!
//! # Limitations
//! - Instance translations and rotations are ignored (reductions do not use
//!   coordinates).
//! - `*Include` is not followed.
//! - Every other keyword is skipped together with its data lines.

use crate::io::{MeshModel, MeshReader};
use crate::result_error::ResultSieveError;
use crate::topology::element_type::ElementType;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::instance::Instance;
use crate::topology::sets::{EntitySet, SetMember};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Instance name given to a mesh defined outside any part.
pub const DEFAULT_INSTANCE: &str = "PART-1-1";

/// Name of the instance holding assembly-level nodes (reference points).
pub const ASSEMBLY_INSTANCE: &str = "ASSEMBLY";

/// Reader for the mesh and set definitions of an Abaqus input file.
#[derive(Debug, Default, Clone)]
pub struct InpReader;

impl InpReader {
    /// Reads an input file from disk.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<MeshModel, ResultSieveError> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }
}

impl MeshReader for InpReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<MeshModel, ResultSieveError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut parser = InpParser::default();
        for (line_no, line) in logical_lines(&contents) {
            if line.starts_with('*') {
                parser.keyword(line_no, &Keyword::parse(&line))?;
            } else {
                parser.data(line_no, &line)?;
            }
        }
        parser.finish()
    }
}

/// Non-comment lines with trailing-comma continuations joined, tagged with
/// the number of their first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("**") {
            continue;
        }
        if line.starts_with('*') {
            out.extend(pending.take());
        }
        match pending.as_mut() {
            Some((_, acc)) => acc.push_str(line),
            None => pending = Some((idx + 1, line.to_string())),
        }
        if !line.ends_with(',') {
            out.extend(pending.take());
        }
    }
    out.extend(pending);
    out
}

/// A keyword line: upper-cased name and `key[=value]` parameters.
#[derive(Debug, Clone)]
struct Keyword {
    name: String,
    params: HashMap<String, Option<String>>,
}

impl Keyword {
    fn parse(line: &str) -> Self {
        let mut parts = line.trim_start_matches('*').split(',');
        let name = parts
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let params = parts
            .filter(|p| !p.trim().is_empty())
            .map(|p| match p.split_once('=') {
                Some((key, value)) => (key.trim().to_ascii_uppercase(), Some(normalize_name(value))),
                None => (p.trim().to_ascii_uppercase(), None),
            })
            .collect();
        Self { name, params }
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }

    fn require(&self, key: &str, line_no: usize) -> Result<&str, ResultSieveError> {
        self.value(key).ok_or_else(|| {
            ResultSieveError::MeshIoParse(format!(
                "line {line_no}: *{} needs a {}= parameter",
                self.name,
                key.to_ascii_lowercase()
            ))
        })
    }

    fn flag(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }
}

fn normalize_name(raw: &str) -> String {
    raw.trim().trim_matches('"').to_ascii_uppercase()
}

fn parse_label(raw: &str, line_no: usize) -> Result<EntityId, ResultSieveError> {
    let raw = raw.trim();
    let label = raw.parse::<u64>().map_err(|_| {
        ResultSieveError::MeshIoParse(format!("line {line_no}: invalid label `{raw}`"))
    })?;
    label_at(label, line_no)
}

fn label_at(label: u64, line_no: usize) -> Result<EntityId, ResultSieveError> {
    EntityId::new(label)
        .map_err(|_| ResultSieveError::MeshIoParse(format!("line {line_no}: label 0 is reserved")))
}

fn parse_coord(raw: &str, line_no: usize) -> Result<f64, ResultSieveError> {
    raw.trim().parse::<f64>().map_err(|_| {
        ResultSieveError::MeshIoParse(format!("line {line_no}: invalid coordinate `{}`", raw.trim()))
    })
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Mesh and sets of one part, or of an instance while it is being read.
#[derive(Debug, Clone)]
struct MeshScope {
    mesh: Instance,
    sets: Vec<EntitySet>,
}

impl MeshScope {
    fn new(name: &str) -> Self {
        Self {
            mesh: Instance::new(name),
            sets: Vec::new(),
        }
    }

    /// Mesh under `name` with every set renamed `<name>.<SET>` and its members
    /// moved to `name`.
    fn materialize(self, name: &str) -> (Instance, Vec<EntitySet>) {
        let mesh = if self.mesh.name() == name {
            self.mesh
        } else {
            self.mesh.renamed(name)
        };
        let sets = self
            .sets
            .iter()
            .map(|set| {
                EntitySet::scoped(
                    format!("{name}.{}", set.name()),
                    set.kind(),
                    name,
                    set.members().iter().map(|m| m.id),
                )
            })
            .collect();
        (mesh, sets)
    }
}

#[derive(Debug, Clone, Default)]
enum Scope {
    #[default]
    Top,
    Part(usize),
    Assembly,
    Instance(Box<MeshScope>),
}

#[derive(Debug, Clone, Default)]
enum Block {
    #[default]
    Skip,
    Nodes,
    Elements {
        element_type: ElementType,
        elset: Option<String>,
    },
    Set {
        kind: EntityKind,
        name: String,
        generate: bool,
        instance: Option<String>,
    },
}

#[derive(Debug, Default)]
struct InpParser {
    parts: Vec<MeshScope>,
    top: Option<MeshScope>,
    assembly_mesh: Option<Instance>,
    instances: Vec<Instance>,
    /// Assembly-level (or file-level) sets, final names.
    sets: Vec<EntitySet>,
    saw_assembly: bool,
    scope: Scope,
    block: Block,
}

impl InpParser {
    fn keyword(&mut self, line_no: usize, kw: &Keyword) -> Result<(), ResultSieveError> {
        self.block = Block::Skip;
        match kw.name.as_str() {
            "PART" => {
                let name = kw.require("NAME", line_no)?;
                self.parts.push(MeshScope::new(name));
                self.scope = Scope::Part(self.parts.len() - 1);
            }
            "END PART" => self.scope = Scope::Top,
            "ASSEMBLY" => {
                self.saw_assembly = true;
                self.scope = Scope::Assembly;
            }
            "END ASSEMBLY" => self.scope = Scope::Top,
            "INSTANCE" => {
                let name = kw.require("NAME", line_no)?;
                let scope = match kw.value("PART") {
                    Some(part) => {
                        let source = self
                            .parts
                            .iter()
                            .find(|p| p.mesh.name() == part)
                            .ok_or_else(|| {
                                ResultSieveError::MeshIoParse(format!(
                                    "line {line_no}: instance `{name}` refers to undefined part `{part}`"
                                ))
                            })?;
                        MeshScope {
                            mesh: source.mesh.renamed(name),
                            sets: source.sets.clone(),
                        }
                    }
                    None => MeshScope::new(name),
                };
                self.scope = Scope::Instance(Box::new(scope));
            }
            "END INSTANCE" => {
                if let Scope::Instance(scope) = std::mem::take(&mut self.scope) {
                    let name = scope.mesh.name().to_string();
                    let (mesh, sets) = scope.materialize(&name);
                    self.instances.push(mesh);
                    self.sets.extend(sets);
                }
                self.scope = Scope::Assembly;
            }
            "NODE" => self.block = Block::Nodes,
            "ELEMENT" => {
                self.block = Block::Elements {
                    element_type: ElementType::new(kw.require("TYPE", line_no)?),
                    elset: kw.value("ELSET").map(str::to_string),
                }
            }
            "NSET" | "ELSET" => {
                let (kind, key) = if kw.name == "NSET" {
                    (EntityKind::Node, "NSET")
                } else {
                    (EntityKind::Element, "ELSET")
                };
                let name = kw.require(key, line_no)?.to_string();
                if let Some(sets) = self.scope_sets_mut() {
                    ensure_set(sets, &name, kind);
                }
                self.block = Block::Set {
                    kind,
                    name,
                    generate: kw.flag("GENERATE"),
                    instance: kw.value("INSTANCE").map(str::to_string),
                };
            }
            other => log::trace!("line {line_no}: skipping *{other}"),
        }
        Ok(())
    }

    fn data(&mut self, line_no: usize, line: &str) -> Result<(), ResultSieveError> {
        match std::mem::take(&mut self.block) {
            Block::Skip => {}
            Block::Nodes => {
                self.node_line(line_no, line)?;
                self.block = Block::Nodes;
            }
            Block::Elements {
                element_type,
                elset,
            } => {
                self.element_line(line_no, line, &element_type, elset.as_deref())?;
                self.block = Block::Elements {
                    element_type,
                    elset,
                };
            }
            Block::Set {
                kind,
                name,
                generate,
                instance,
            } => {
                let members = self.set_members(line_no, line, kind, generate, instance.as_deref())?;
                if let Some(sets) = self.scope_sets_mut() {
                    let set = ensure_set(sets, &name, kind);
                    for m in members {
                        set.push(&m.instance, m.id);
                    }
                }
                self.block = Block::Set {
                    kind,
                    name,
                    generate,
                    instance,
                };
            }
        }
        Ok(())
    }

    fn node_line(&mut self, line_no: usize, line: &str) -> Result<(), ResultSieveError> {
        let mut fields = tokens(line);
        let id = parse_label(fields.next().unwrap_or_default(), line_no)?;
        let mut xyz = [0.0; 3];
        let mut count = 0;
        for (slot, raw) in xyz.iter_mut().zip(fields) {
            *slot = parse_coord(raw, line_no)?;
            count += 1;
        }
        if count < 2 {
            return Err(ResultSieveError::MeshIoParse(format!(
                "line {line_no}: node {id} needs at least two coordinates"
            )));
        }
        self.mesh_mut().try_add_node(id, Some(xyz))
    }

    fn element_line(
        &mut self,
        line_no: usize,
        line: &str,
        element_type: &ElementType,
        elset: Option<&str>,
    ) -> Result<(), ResultSieveError> {
        let mut fields = tokens(line);
        let id = parse_label(fields.next().unwrap_or_default(), line_no)?;
        let connectivity = fields
            .map(|raw| parse_label(raw, line_no))
            .collect::<Result<Vec<_>, _>>()?;
        if connectivity.is_empty() {
            return Err(ResultSieveError::MeshIoParse(format!(
                "line {line_no}: element {id} has no nodes"
            )));
        }
        let mesh = self.mesh_mut();
        mesh.try_add_element(id, element_type.clone(), connectivity)?;
        let owner = mesh.name().to_string();
        if let (Some(name), Some(sets)) = (elset, self.scope_sets_mut()) {
            ensure_set(sets, name, EntityKind::Element).push(&owner, id);
        }
        Ok(())
    }

    fn set_members(
        &self,
        line_no: usize,
        line: &str,
        kind: EntityKind,
        generate: bool,
        instance: Option<&str>,
    ) -> Result<Vec<SetMember>, ResultSieveError> {
        let owner = instance.map(str::to_string).or_else(|| self.default_owner());
        let member = |id: EntityId| -> Result<SetMember, ResultSieveError> {
            let instance = owner.clone().ok_or_else(|| {
                ResultSieveError::MeshIoParse(format!(
                    "line {line_no}: set member {id} has no instance"
                ))
            })?;
            Ok(SetMember { instance, id })
        };

        if generate {
            let bounds = tokens(line)
                .map(|raw| {
                    raw.parse::<u64>().map_err(|_| {
                        ResultSieveError::MeshIoParse(format!(
                            "line {line_no}: invalid generate bound `{raw}`"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let (start, end, step) = match bounds.as_slice() {
                [start, end] => (*start, *end, 1),
                [start, end, step] => (*start, *end, *step),
                _ => {
                    return Err(ResultSieveError::MeshIoParse(format!(
                        "line {line_no}: generate expects start, end[, step]"
                    )));
                }
            };
            if step == 0 || end < start {
                return Err(ResultSieveError::MeshIoParse(format!(
                    "line {line_no}: empty generate range {start}..{end} by {step}"
                )));
            }
            return (start..=end)
                .step_by(step as usize)
                .map(|raw| member(label_at(raw, line_no)?))
                .collect();
        }

        let mut members = Vec::new();
        for token in tokens(line) {
            let upper = token.to_ascii_uppercase();
            if token.bytes().all(|b| b.is_ascii_digit()) {
                members.push(member(parse_label(token, line_no)?)?);
            } else if let Some((inst, label)) = upper
                .rsplit_once('.')
                .filter(|(_, label)| label.bytes().all(|b| b.is_ascii_digit()))
            {
                members.push(SetMember {
                    instance: inst.to_string(),
                    id: parse_label(label, line_no)?,
                });
            } else {
                let referenced = self
                    .scope_sets()
                    .and_then(|sets| {
                        sets.iter()
                            .find(|s| s.kind() == kind && s.name() == upper)
                    })
                    .ok_or_else(|| {
                        ResultSieveError::MeshIoParse(format!(
                            "line {line_no}: reference to undefined {kind} set `{token}`"
                        ))
                    })?;
                members.extend(referenced.members().iter().cloned());
            }
        }
        Ok(members)
    }

    /// Instance that owns plain labels in the current scope.
    fn default_owner(&self) -> Option<String> {
        match &self.scope {
            Scope::Top => Some(DEFAULT_INSTANCE.to_string()),
            Scope::Part(idx) => self.parts.get(*idx).map(|p| p.mesh.name().to_string()),
            Scope::Instance(scope) => Some(scope.mesh.name().to_string()),
            Scope::Assembly => Some(ASSEMBLY_INSTANCE.to_string()),
        }
    }

    fn mesh_mut(&mut self) -> &mut Instance {
        match &mut self.scope {
            Scope::Top => &mut self.top.get_or_insert_with(|| MeshScope::new(DEFAULT_INSTANCE)).mesh,
            Scope::Part(idx) => &mut self.parts[*idx].mesh,
            Scope::Instance(scope) => &mut scope.mesh,
            Scope::Assembly => self
                .assembly_mesh
                .get_or_insert_with(|| Instance::new(ASSEMBLY_INSTANCE)),
        }
    }

    fn scope_sets(&self) -> Option<&Vec<EntitySet>> {
        match &self.scope {
            Scope::Top | Scope::Assembly => Some(&self.sets),
            Scope::Part(idx) => self.parts.get(*idx).map(|p| &p.sets),
            Scope::Instance(scope) => Some(&scope.sets),
        }
    }

    fn scope_sets_mut(&mut self) -> Option<&mut Vec<EntitySet>> {
        match &mut self.scope {
            Scope::Top | Scope::Assembly => Some(&mut self.sets),
            Scope::Part(idx) => self.parts.get_mut(*idx).map(|p| &mut p.sets),
            Scope::Instance(scope) => Some(&mut scope.sets),
        }
    }

    fn finish(self) -> Result<MeshModel, ResultSieveError> {
        let mut instances = Vec::new();
        let mut sets = Vec::new();
        if let Some(top) = self.top {
            instances.push(top.mesh);
        }
        if self.saw_assembly {
            instances.extend(self.instances);
            instances.extend(self.assembly_mesh);
        } else {
            for part in self.parts {
                let name = part.mesh.name().to_string();
                let (mesh, part_sets) = part.materialize(&name);
                instances.push(mesh);
                sets.extend(part_sets);
            }
        }
        sets.extend(self.sets);
        log::debug!(
            "read input file: {} instances, {} sets",
            instances.len(),
            sets.len()
        );
        Ok(MeshModel { instances, sets })
    }
}

fn ensure_set<'s>(sets: &'s mut Vec<EntitySet>, name: &str, kind: EntityKind) -> &'s mut EntitySet {
    let pos = match sets.iter().position(|s| s.kind() == kind && s.name() == name) {
        Some(pos) => pos,
        None => {
            sets.push(EntitySet::new(name, kind));
            sets.len() - 1
        }
    };
    &mut sets[pos]
}
