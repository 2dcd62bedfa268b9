use crate::resolve::TileData;

/// Yields the tiles of one layer per step, in document layer order.
///
/// Hidden layers and layers with nothing in view yield an empty slice, so
/// the n-th item always belongs to the n-th layer. The iterator borrows the
/// map's cache; take a [`TileSnapshot`] to keep results past the next query.
#[derive(Debug, Clone)]
pub struct LayerTiles<'a> {
    tiles: &'a [TileData],
    offsets: &'a [usize],
    index: usize,
}

impl<'a> LayerTiles<'a> {
    pub(crate) fn new(tiles: &'a [TileData], offsets: &'a [usize]) -> Self {
        LayerTiles {
            tiles,
            offsets,
            index: 0,
        }
    }

    /// Number of layers covered.
    pub fn layer_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Index of the layer the next call to `next` returns.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Starts over from the first layer.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Tiles of layer `i`, independent of the iteration position.
    pub fn layer(&self, i: usize) -> Option<&'a [TileData]> {
        if i >= self.layer_count() {
            return None;
        }
        Some(&self.tiles[self.offsets[i]..self.offsets[i + 1]])
    }

    /// All tiles of all layers, back to back.
    pub fn all(&self) -> &'a [TileData] {
        self.tiles
    }

    /// Copies the results so they outlive the map borrow.
    pub fn to_snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            tiles: self.tiles.to_vec(),
            offsets: self.offsets.to_vec(),
        }
    }
}

impl<'a> Iterator for LayerTiles<'a> {
    type Item = &'a [TileData];

    fn next(&mut self) -> Option<Self::Item> {
        let slice = self.layer(self.index)?;
        self.index += 1;
        Some(slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.layer_count().saturating_sub(self.index);
        (left, Some(left))
    }
}

impl ExactSizeIterator for LayerTiles<'_> {}

/// Owned copy of one query's results. `Send`, and unaffected by later
/// queries on the map it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSnapshot {
    tiles: Vec<TileData>,
    offsets: Vec<usize>,
}

impl TileSnapshot {
    /// Iterates the copied layers.
    pub fn iter(&self) -> LayerTiles<'_> {
        LayerTiles::new(&self.tiles, &self.offsets)
    }

    /// Number of layers copied.
    pub fn layer_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Tiles across all layers.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::gid::FlipFlags;
    use macroquad::prelude::*;

    fn tiles(n: usize) -> Vec<TileData> {
        (0..n)
            .map(|i| TileData {
                pos: vec2(i as f32, 0.0),
                tile_id: i as u32,
                tileset: 0,
                flip: FlipFlags::empty(),
            })
            .collect()
    }

    #[test]
    fn one_slice_per_layer_including_empty_ones() {
        let t = tiles(4);
        let offsets = [0, 3, 3, 4];
        let it = LayerTiles::new(&t, &offsets);
        assert_eq!(it.len(), 3);

        let lens: Vec<usize> = it.map(|s| s.len()).collect();
        assert_eq!(lens, vec![3, 0, 1]);
    }

    #[test]
    fn reset_restarts() {
        let t = tiles(2);
        let offsets = [0, 1, 2];
        let mut it = LayerTiles::new(&t, &offsets);
        assert!(it.next().is_some());
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert_eq!(it.index(), 2);

        it.reset();
        assert_eq!(it.next().map(|s| s[0].tile_id), Some(0));
    }

    #[test]
    fn empty_offsets_yield_nothing() {
        let mut it = LayerTiles::new(&[], &[]);
        assert_eq!(it.layer_count(), 0);
        assert!(it.next().is_none());
    }

    #[test]
    fn snapshot_is_independent() {
        let mut t = tiles(3);
        let offsets = vec![0, 3];
        let snap = LayerTiles::new(&t, &offsets).to_snapshot();
        t.clear();

        assert_eq!(snap.tile_count(), 3);
        assert_eq!(snap.iter().layer(0).map(|s| s.len()), Some(3));
    }
}
