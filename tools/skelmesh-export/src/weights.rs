//! Skin weight assignment
//!
//! Spreads a mesh's per-bone vertex weights onto the four influence slots of
//! each vertex. Bones are processed in table order; each kept weight takes
//! the first free slot of its vertex. Weights under [`MIN_SKIN_WEIGHT`] are
//! discarded and influences past the fourth are dropped. Weights are not
//! renormalized.

use anyhow::{Result, bail};
use skelmesh_common::{MIN_SKIN_WEIGHT, VertexRecord};

use crate::scene::SceneBone;

/// Counters from one assignment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightStats {
    /// Weights that landed in a slot
    pub assigned: usize,
    /// Weights under the threshold
    pub below_threshold: usize,
    /// Weights lost because the vertex had no free slot
    pub dropped: usize,
}

/// Fill influence slots of `vertices` from `bones`.
///
/// Bone `i` of `bones` becomes flat bone index `i`.
pub fn assign_skin_weights(
    vertices: &mut [VertexRecord],
    bones: &[SceneBone],
) -> Result<WeightStats> {
    let mut stats = WeightStats::default();

    for (index, bone) in bones.iter().enumerate() {
        for w in &bone.weights {
            if w.weight.is_nan() || w.weight < MIN_SKIN_WEIGHT {
                stats.below_threshold += 1;
                continue;
            }

            let Some(vertex) = vertices.get_mut(w.vertex as usize) else {
                bail!(
                    "Bone '{}' weights vertex {}, but the mesh has {} vertices",
                    bone.name,
                    w.vertex,
                    vertices.len()
                );
            };

            if vertex.push_influence(index as u32, w.weight) {
                stats.assigned += 1;
            } else {
                stats.dropped += 1;
            }
        }
    }

    if stats.dropped > 0 {
        tracing::warn!(
            "{} influences dropped from vertices already holding 4 bones",
            stats.dropped
        );
    }

    Ok(stats)
}
