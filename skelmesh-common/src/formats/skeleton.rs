//! Flat bone table of one mesh.
//!
//! Bones are identified by position only. Parent links are indices into the
//! same table, which keeps the skeleton relocatable as a plain array.

use hashbrown::HashMap;

use super::BoneRecord;
use crate::FormatError;

/// Ordered bone table of one mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    bones: Vec<BoneRecord>,
}

impl Skeleton {
    pub fn new(bones: Vec<BoneRecord>) -> Self {
        Self { bones }
    }

    pub fn bones(&self) -> &[BoneRecord] {
        &self.bones
    }

    pub fn into_bones(self) -> Vec<BoneRecord> {
        self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&BoneRecord> {
        self.bones.get(index as usize)
    }

    pub fn parent_of(&self, index: u32) -> Option<u32> {
        self.get(index).and_then(|b| b.parent)
    }

    /// Index of the first bone with this name
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| i as u32)
    }

    /// Name -> flat index map (first occurrence wins)
    pub fn name_index(&self) -> HashMap<&str, u32> {
        let mut map = HashMap::with_capacity(self.bones.len());
        for (i, bone) in self.bones.iter().enumerate() {
            map.entry(bone.name.as_str()).or_insert(i as u32);
        }
        map
    }

    /// Bones parented directly at the mesh root
    pub fn roots(&self) -> impl Iterator<Item = u32> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i as u32)
    }

    /// Parent chain of a bone, nearest first.
    ///
    /// Bounded by the bone count so a malformed table cannot loop forever.
    pub fn ancestors(&self, index: u32) -> impl Iterator<Item = u32> + '_ {
        let mut current = self.parent_of(index);
        let mut remaining = self.bones.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let here = current?;
            current = self.parent_of(here);
            Some(here)
        })
    }

    /// Check parent closure: every parent index is in range and every parent
    /// chain reaches a root.
    ///
    /// Linear in the bone count: each bone is walked at most once.
    pub fn validate(&self, mesh: &str) -> Result<(), FormatError> {
        let count = self.bones.len();

        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent.filter(|&p| p as usize >= count) {
                return Err(FormatError::InvalidParentIndex {
                    mesh: mesh.to_string(),
                    bone: i as u32,
                    parent: parent as i32,
                    bone_count: count as u32,
                });
            }
        }

        let mut marks = vec![Mark::Unvisited; count];
        let mut path = Vec::new();
        for start in 0..count {
            let mut current = Some(start);
            while let Some(i) = current {
                match marks[i] {
                    Mark::Done => break,
                    Mark::InProgress => {
                        return Err(FormatError::CyclicBoneHierarchy {
                            mesh: mesh.to_string(),
                            bone: i as u32,
                        });
                    }
                    Mark::Unvisited => {
                        marks[i] = Mark::InProgress;
                        path.push(i);
                        current = self.bones[i].parent.map(|p| p as usize);
                    }
                }
            }
            for i in path.drain(..) {
                marks[i] = Mark::Done;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl From<Vec<BoneRecord>> for Skeleton {
    fn from(bones: Vec<BoneRecord>) -> Self {
        Self::new(bones)
    }
}
