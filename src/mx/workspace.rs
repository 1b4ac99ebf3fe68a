/// Dependency bits of one scalar element. Every bit is an independent seed direction.
pub type BVec = u64;

/// Scratch memory of one traversal, owned by the driver.
///
/// `slots[k]` holds the nonzeros produced by algorithm step `k`. The element type is
/// a float, a symbolic scalar or a [`BVec`], depending on the traversal. `iw` is
/// integer scratch for node kinds that need it.
#[derive(Debug, Clone)]
pub struct Workspace<T> {
    pub(crate) slots: Vec<Vec<T>>,
    pub(crate) iw: Vec<usize>,
}

impl<T: Clone> Workspace<T> {
    pub fn new(slot_sizes: impl IntoIterator<Item = usize>, sz_iw: usize, fill: T) -> Self {
        Self {
            slots: slot_sizes
                .into_iter()
                .map(|n| vec![fill.clone(); n])
                .collect(),
            iw: vec![0; sz_iw],
        }
    }

    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, slot: usize) -> &[T] {
        &self.slots[slot]
    }

    pub fn slot_mut(&mut self, slot: usize) -> &mut [T] {
        &mut self.slots[slot]
    }

    /// Copy the contents of `src` into `dst`. Nothing happens if they are the same slot.
    pub fn copy(&mut self, src: usize, dst: usize) {
        if src == dst {
            return;
        }
        let (src, dst) = slot_pair(&mut self.slots, src, dst);
        dst.clone_from_slice(src);
    }
}

impl Workspace<BVec> {
    /// OR the bits of `res` into `arg` and clear `res`. Nothing happens if they are the
    /// same slot.
    pub fn copy_rev(&mut self, arg: usize, res: usize) {
        if arg == res {
            return;
        }
        let (arg, res) = slot_pair(&mut self.slots, arg, res);
        assert_eq!(arg.len(), res.len());
        for (a, r) in arg.iter_mut().zip(res.iter_mut()) {
            *a |= *r;
            *r = 0;
        }
    }
}

/// Two distinct slots, borrowed mutably at the same time.
pub(crate) fn slot_pair<T>(slots: &mut [Vec<T>], a: usize, b: usize) -> (&mut [T], &mut [T]) {
    assert_ne!(a, b);
    if a < b {
        let (lo, hi) = slots.split_at_mut(b);
        (lo[a].as_mut_slice(), hi[0].as_mut_slice())
    } else {
        let (lo, hi) = slots.split_at_mut(a);
        (hi[0].as_mut_slice(), lo[b].as_mut_slice())
    }
}
