//! Enumeration helpers shared by the generators and converters.

/// Every value tuple over the given domain sizes, in lexicographic order
/// (last position varies fastest).
pub fn cartesian_product(sizes: &[u32]) -> Vec<Vec<u32>> {
    if sizes.iter().any(|&s| s == 0) {
        return Vec::new();
    }
    let mut tuples = vec![Vec::with_capacity(sizes.len())];
    for &size in sizes {
        let mut next = Vec::with_capacity(tuples.len() * size as usize);
        for prefix in &tuples {
            for value in 0..size {
                let mut tuple = prefix.clone();
                tuple.push(value);
                next.push(tuple);
            }
        }
        tuples = next;
    }
    tuples
}

/// Every `k`-element subset of `items`, preserving item order, in
/// lexicographic order of positions.
pub fn subsets(items: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    if k > items.len() {
        return result;
    }
    let mut current = Vec::with_capacity(k);
    collect_subsets(items, k, 0, &mut current, &mut result);
    result
}

fn collect_subsets(
    items: &[usize],
    k: usize,
    start: usize,
    current: &mut Vec<usize>,
    result: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    let needed = k - current.len();
    for i in start..=(items.len() - needed) {
        current.push(items[i]);
        collect_subsets(items, k, i + 1, current, result);
        current.pop();
    }
}
