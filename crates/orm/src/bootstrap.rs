//! One-shot relation resolution
//!
//! Bootstrap runs four passes over the registry in insertion order:
//!
//! 1. resolve relation targets and materialize many-to-many junction tables;
//! 2. pair declared reverse fields with forward relations and synthesize a
//!    reverse field for every forward relation left without one;
//! 3. link each many-to-many field to the two FK fields of its junction;
//! 4. cross-link every reverse field with its forward partner.
//!
//! The first failing pass stops the run.

use std::collections::HashSet;

use tracing::debug;

use crate::error::ResolutionError;
use crate::metadata::{FieldId, FieldInfo, FieldKind, FieldLink, ModelId, ModelInfo, RelationKind};
use crate::naming::snake_string;
use crate::registry::ModelStore;

/// Number of numbered variants tried when a reverse field name is taken
const REVERSE_NAME_RETRIES: usize = 5;

/// Counts reported by a successful bootstrap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub models: usize,
    pub junctions: usize,
    pub reverse_fields: usize,
}

/// Reverse/forward pairings decided while matching, applied by the last pass
#[derive(Debug, Default)]
struct Resolution {
    pairs: Vec<(FieldId, FieldId)>,
    claimed_forward: HashSet<FieldId>,
    claimed_reverse: HashSet<FieldId>,
    summary: BootstrapSummary,
}

impl Resolution {
    fn pair(&mut self, reverse: FieldId, forward: FieldId) {
        self.pairs.push((reverse, forward));
        self.claimed_forward.insert(forward);
        self.claimed_reverse.insert(reverse);
    }
}

type Pass = fn(&mut ModelStore, &mut Resolution) -> Result<(), ResolutionError>;

const PASSES: [(&str, Pass); 4] = [
    ("relation targets", resolve_targets),
    ("reverse fields", synthesize_reverse_fields),
    ("junction links", link_junctions),
    ("reverse finalization", finalize_reverse_fields),
];

pub(crate) fn run(store: &mut ModelStore) -> Result<BootstrapSummary, ResolutionError> {
    let mut resolution = Resolution::default();
    for (name, pass) in PASSES {
        debug!("Bootstrap pass: {}", name);
        pass(store, &mut resolution)?;
    }
    resolution.summary.models = store.len();
    Ok(resolution.summary)
}

fn field_ids(store: &ModelStore, filter: impl Fn(&FieldInfo) -> bool) -> Vec<FieldId> {
    (0..store.len())
        .map(ModelId)
        .flat_map(|id| {
            store
                .model(id)
                .fields
                .iter()
                .enumerate()
                .filter(|(_, fi)| filter(fi))
                .map(move |(index, _)| FieldId::new(id, index))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn link_to(store: &ModelStore, id: FieldId) -> FieldLink {
    FieldLink::new(store.field(id).name.clone(), id)
}

/// Resolve relation targets and materialize many-to-many junction tables
fn resolve_targets(store: &mut ModelStore, resolution: &mut Resolution) -> Result<(), ResolutionError> {
    // junctions appended by this pass already carry resolved links
    let relation_fields = field_ids(store, |fi| fi.is_rel() || fi.is_reverse());

    for id in relation_fields {
        let fi = store.field(id);
        let target = fi.target.clone().unwrap_or_default();
        let related = store
            .id_of(&target)
            .ok_or_else(|| ResolutionError::UnresolvedRelationTarget {
                field: fi.full_name.clone(),
                target: target.clone(),
            })?;

        let relation = fi.relation;
        let rel_through = fi.rel_through.clone();
        let rel_table = fi.rel_table.clone();
        store.field_mut(id).related_model = Some(related);

        if relation != RelationKind::ManyToMany {
            continue;
        }

        let through = match rel_through {
            Some(path) => resolve_through(store, id, &path)?,
            None => {
                let junction = ModelInfo::new_m2m(
                    store.model(id.model),
                    store.model(related),
                    rel_table.as_deref(),
                    &store.field(id).full_name,
                )?;
                if store.contains_table(&junction.table) || store.contains_full_name(&junction.full_name) {
                    return Err(ResolutionError::TableNameCollision {
                        field: store.field(id).full_name.clone(),
                        table: junction.table,
                    });
                }
                debug!(
                    "Synthesized junction `{}` for `{}`",
                    junction.table,
                    store.field(id).full_name
                );
                resolution.summary.junctions += 1;
                store.insert(junction)
            }
        };

        let through_model = store.model_mut(through);
        through_model.is_through = true;
        let through_table = through_model.table.clone();

        let fi = store.field_mut(id);
        fi.through_model = Some(through);
        fi.rel_table = Some(through_table);
    }

    Ok(())
}

/// Resolve a `rel_through(pkg::Model)` path to a registered model
fn resolve_through(store: &ModelStore, id: FieldId, path: &str) -> Result<ModelId, ResolutionError> {
    let unresolved = || ResolutionError::UnresolvedThrough {
        field: store.field(id).full_name.clone(),
        through: path.to_string(),
    };

    let pkg = match path.rfind("::") {
        Some(i) if i > 0 && i + 2 < path.len() => &path[..i],
        _ => return Err(unresolved()),
    };
    let through = store.id_of(path).ok_or_else(unresolved)?;
    if store.model(through).pkg != pkg {
        return Err(unresolved());
    }
    Ok(through)
}

/// Forward relations of `source` pointing at `owner` that no reverse field claimed yet
fn unclaimed_forward<'a>(
    store: &'a ModelStore,
    resolution: &'a Resolution,
    source: ModelId,
    owner: ModelId,
    relation: RelationKind,
) -> impl Iterator<Item = (FieldId, &'a FieldInfo)> + 'a {
    store
        .model(source)
        .fields
        .by_relation(relation)
        .map(move |(index, fi)| (FieldId::new(source, index), fi))
        .filter(move |(id, fi)| {
            fi.related_model == Some(owner) && !resolution.claimed_forward.contains(id)
        })
}

fn through_matches(reverse: &FieldInfo, forward: &FieldInfo) -> bool {
    let through = reverse.rel_through.as_deref();
    let table = reverse.rel_table.as_deref();
    (through.is_some() && through == forward.rel_through.as_deref())
        || (table.is_some() && table == forward.rel_table.as_deref())
        || (through.is_none() && table.is_none())
}

fn match_declared_reverse(store: &ModelStore, resolution: &Resolution, id: FieldId) -> Option<FieldId> {
    let reverse = store.field(id);
    let source = reverse.related_model?;

    match reverse.relation {
        RelationKind::ReverseOne => {
            unclaimed_forward(store, resolution, source, id.model, RelationKind::OneToOne)
                .map(|(fid, _)| fid)
                .next()
        }
        RelationKind::ReverseMany => {
            unclaimed_forward(store, resolution, source, id.model, RelationKind::ForeignKey)
                .map(|(fid, _)| fid)
                .next()
                .or_else(|| {
                    unclaimed_forward(store, resolution, source, id.model, RelationKind::ManyToMany)
                        .find(|(_, fi)| through_matches(reverse, fi))
                        .map(|(fid, _)| fid)
                })
        }
        _ => None,
    }
}

/// Pair declared reverse fields, then synthesize the missing ones
fn synthesize_reverse_fields(
    store: &mut ModelStore,
    resolution: &mut Resolution,
) -> Result<(), ResolutionError> {
    for id in field_ids(store, FieldInfo::is_reverse) {
        if let Some(forward) = match_declared_reverse(store, resolution, id) {
            resolution.pair(id, forward);
        }
    }

    for forward in field_ids(store, FieldInfo::is_rel) {
        if resolution.claimed_forward.contains(&forward) {
            continue;
        }

        let owner = store.model(forward.model);
        let fi = store.field(forward);
        let Some(target) = fi.related_model else {
            return Err(ResolutionError::UnresolvedRelationTarget {
                field: fi.full_name.clone(),
                target: fi.target.clone().unwrap_or_default(),
            });
        };

        let base = snake_string(&owner.name);
        let mut reverse = FieldInfo::new(base.clone(), base.clone(), FieldKind::Relation);
        reverse.relation = if fi.relation == RelationKind::OneToOne {
            RelationKind::ReverseOne
        } else {
            RelationKind::ReverseMany
        };
        reverse.related_model = Some(forward.model);
        reverse.target = Some(owner.full_name.clone());
        if fi.relation == RelationKind::ManyToMany {
            reverse.rel_table = fi.rel_table.clone();
        }
        let forward_name = fi.full_name.clone();

        let target_model = store.model_mut(target);
        let target_full_name = target_model.full_name.clone();
        reverse.full_name = format!("{}.{}", target_full_name, base);

        let mut attempt = 0;
        let index = loop {
            match target_model.fields.add(reverse) {
                Ok(index) => break index,
                Err(mut rejected) if attempt < REVERSE_NAME_RETRIES => {
                    let name = format!("{}{}", base, attempt);
                    rejected.full_name = format!("{}.{}", target_full_name, name);
                    rejected.column = name.clone();
                    rejected.name = name;
                    reverse = rejected;
                    attempt += 1;
                }
                Err(_) => {
                    return Err(ResolutionError::ReverseFieldGenerationFailed {
                        field: forward_name,
                        model: target_full_name,
                    })
                }
            }
        };

        let reverse_id = FieldId::new(target, index);
        debug!(
            "Synthesized reverse field `{}` for `{}`",
            store.field(reverse_id).full_name,
            forward_name
        );
        resolution.summary.reverse_fields += 1;
        resolution.pair(reverse_id, forward);
    }

    Ok(())
}

/// Point every many-to-many field at the two link fields of its junction
fn link_junctions(store: &mut ModelStore, _resolution: &mut Resolution) -> Result<(), ResolutionError> {
    for id in field_ids(store, |fi| fi.relation == RelationKind::ManyToMany) {
        let fi = store.field(id);
        let other = fi.related_model;
        let not_found = || ResolutionError::M2MLinkNotFound {
            field: fi.full_name.clone(),
            through: fi
                .through_model
                .map(|t| store.model(t).full_name.clone())
                .unwrap_or_default(),
        };
        let through = fi.through_model.ok_or_else(not_found)?;

        let links: Vec<(FieldId, Option<ModelId>)> = store
            .model(through)
            .fields
            .iter()
            .enumerate()
            .filter(|(_, link)| link.relation.is_column_link())
            .map(|(index, link)| (FieldId::new(through, index), link.related_model))
            .collect();

        // for self-referencing relations the first link is this side
        let own = links.iter().find(|(_, related)| *related == Some(id.model));
        let two = links
            .iter()
            .find(|(link, related)| *related == other && Some(*link) != own.map(|(l, _)| *l));

        let (own, two) = match (own, two) {
            (Some((own, _)), Some((two, _))) => (link_to(store, *own), link_to(store, *two)),
            _ => return Err(not_found()),
        };

        let fi = store.field_mut(id);
        fi.reverse_field = Some(own);
        fi.reverse_field_two = Some(two);
    }

    Ok(())
}

/// Cross-link every reverse field with the forward field it was paired with
fn finalize_reverse_fields(
    store: &mut ModelStore,
    resolution: &mut Resolution,
) -> Result<(), ResolutionError> {
    for id in field_ids(store, FieldInfo::is_reverse) {
        if !resolution.claimed_reverse.contains(&id) {
            let fi = store.field(id);
            return Err(ResolutionError::ReverseFieldUnmatched {
                field: fi.full_name.clone(),
                model: fi
                    .related_model
                    .map(|m| store.model(m).full_name.clone())
                    .unwrap_or_default(),
            });
        }
    }

    for &(reverse, forward) in &resolution.pairs {
        let reverse_link = link_to(store, reverse);
        let forward_link = link_to(store, forward);
        let fwd = store.field(forward);

        if fwd.relation == RelationKind::ManyToMany {
            let own = fwd.reverse_field.clone();
            let two = fwd.reverse_field_two.clone();
            let through = fwd.through_model;

            let rev = store.field_mut(reverse);
            rev.reverse_field = two;
            rev.reverse_field_two = own;
            rev.through_model = through;
            rev.reverse_field_m2m = Some(forward_link);
            store.field_mut(forward).reverse_field_m2m = Some(reverse_link);
        } else {
            store.field_mut(reverse).reverse_field = Some(forward_link);
            store.field_mut(forward).reverse_field = Some(reverse_link);
        }
    }

    Ok(())
}
