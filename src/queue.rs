use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::IntakeError;

/// An image blob as handed in by the user. Its size is unknown until decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// where the image came from, for messages
    pub name: String,
    pub data: Arc<[u8]>,
}

impl ImageAsset {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        ImageAsset {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(ImageAsset::new(path.display().to_string(), data))
    }
}

/// Identifier handed out on intake; stays valid while other images are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(u32);

impl ImageId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ImageId {
    fn from(id: u32) -> Self {
        ImageId(id)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ordered collection of images waiting to be converted.
///
/// Ids are assigned 1, 2, 3, ... in intake order and never reused, so
/// removing by id is unaffected by earlier removals. Conversion works on a
/// [`snapshot`](ImageQueue::snapshot), never on the queue itself.
#[derive(Debug, Default)]
pub struct ImageQueue {
    entries: Vec<(ImageId, ImageAsset)>,
    next_id: u32,
}

impl ImageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: ImageAsset) -> ImageId {
        self.next_id += 1;
        let id = ImageId(self.next_id);
        self.entries.push((id, asset));
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageAsset> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, asset)| asset)
    }

    pub fn ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn remove(&mut self, id: ImageId) -> Result<ImageAsset, IntakeError> {
        let index = self
            .entries
            .iter()
            .position(|(entry_id, _)| *entry_id == id)
            .ok_or(IntakeError::UnknownId(id.0))?;
        Ok(self.entries.remove(index).1)
    }

    /// remove by current position; later images shift down by one
    pub fn remove_at(&mut self, index: usize) -> Result<ImageAsset, IntakeError> {
        if index >= self.entries.len() {
            return Err(IntakeError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index).1)
    }

    /// the current images in order; image data is shared, not copied
    pub fn snapshot(&self) -> Vec<ImageAsset> {
        self.entries.iter().map(|(_, asset)| asset.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(names: &[&str]) -> ImageQueue {
        let mut q = ImageQueue::new();
        for name in names {
            q.push(ImageAsset::new(*name, name.as_bytes().to_vec()));
        }
        q
    }

    fn names(q: &ImageQueue) -> Vec<String> {
        q.snapshot().into_iter().map(|a| a.name).collect()
    }

    #[test]
    fn ids_follow_intake_order() {
        let q = queue_of(&["a", "b", "c"]);
        let ids: Vec<u32> = q.ids().map(ImageId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(q.get(ImageId::from(2)).unwrap().name, "b");
    }

    #[test]
    fn remove_by_id_is_order_independent() {
        let mut q = queue_of(&["a", "b", "c", "d"]);
        q.remove(ImageId::from(1)).unwrap();
        q.remove(ImageId::from(3)).unwrap();
        assert_eq!(names(&q), vec!["b", "d"]);
    }

    #[test]
    fn remove_at_shifts_later_images() {
        let mut q = queue_of(&["a", "b", "c"]);
        assert_eq!(q.remove_at(0).unwrap().name, "a");
        assert_eq!(q.remove_at(0).unwrap().name, "b");
        assert_eq!(names(&q), vec!["c"]);
    }

    #[test]
    fn remove_errors() {
        let mut q = queue_of(&["a"]);
        assert_eq!(
            q.remove_at(1),
            Err(IntakeError::IndexOutOfBounds { index: 1, len: 1 })
        );
        q.remove(ImageId::from(1)).unwrap();
        assert_eq!(q.remove(ImageId::from(1)), Err(IntakeError::UnknownId(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut q = queue_of(&["a"]);
        q.remove_at(0).unwrap();
        let id = q.push(ImageAsset::new("b", vec![1u8]));
        assert_eq!(id.get(), 2);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_edits() {
        let mut q = queue_of(&["a", "b"]);
        let snap = q.snapshot();
        q.remove_at(0).unwrap();
        q.push(ImageAsset::new("c", vec![0u8]));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].name, "a");
        assert!(Arc::ptr_eq(&snap[1].data, &q.get(ImageId::from(2)).unwrap().data));
    }
}
