use crate::currency::Amount;

/// Exposes the stable identifier assigned by the ledger.
pub trait Identifiable {
    fn id(&self) -> u64;
}

pub(crate) fn find_by_id<T: Identifiable>(items: &[T], id: u64) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

pub(crate) fn find_by_id_mut<T: Identifiable>(items: &mut [T], id: u64) -> Option<&mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Removes the record with `id`, keeping the order of the rest.
pub(crate) fn remove_by_id<T: Identifiable>(items: &mut Vec<T>, id: u64) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}

pub(crate) fn max_id<T: Identifiable>(items: &[T]) -> Option<u64> {
    items.iter().map(Identifiable::id).max()
}

/// Supplies a monetary amount for aggregation.
pub trait Amounted {
    fn amount(&self) -> Amount;
}

/// Sums the amounts of any sequence of [`Amounted`] records.
pub fn sum_amounts<'a, T, I>(items: I) -> Amount
where
    T: Amounted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(Amounted::amount).sum()
}
