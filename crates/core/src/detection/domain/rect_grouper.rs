use crate::shared::region::Region;

/// Clusters raw sliding-window hits into final detections.
///
/// Hits are partitioned by a size-relative similarity predicate, each
/// cluster is replaced by its averaged rectangle, clusters with
/// `group_threshold` or fewer members are dropped, and a cluster lying
/// inside a stronger one is suppressed. Output order follows the first
/// appearance of each cluster in `rects`.
///
/// With `group_threshold == 0` the hits are returned untouched.
pub fn group_rectangles(rects: &[Region], group_threshold: u32, eps: f64) -> Vec<Region> {
    if group_threshold == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let (labels, nclasses) = partition(rects, eps);

    let mut sums = vec![[0i64; 4]; nclasses];
    let mut weights = vec![0u32; nclasses];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += r.x as i64;
        s[1] += r.y as i64;
        s[2] += r.width as i64;
        s[3] += r.height as i64;
        weights[label] += 1;
    }

    let averaged: Vec<Region> = sums
        .iter()
        .zip(&weights)
        .map(|(s, &n)| {
            let inv = 1.0 / n as f64;
            Region::new(
                (s[0] as f64 * inv).round() as i32,
                (s[1] as f64 * inv).round() as i32,
                (s[2] as f64 * inv).round() as i32,
                (s[3] as f64 * inv).round() as i32,
            )
        })
        .collect();

    let mut grouped = Vec::new();
    for (i, r1) in averaged.iter().enumerate() {
        let n1 = weights[i];
        if n1 <= group_threshold {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, r2)| {
            let n2 = weights[j];
            if j == i || n2 <= group_threshold {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.right() <= r2.right() + dx
                && r1.bottom() <= r2.bottom() + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            grouped.push(*r1);
        }
    }
    grouped
}

fn similar(a: &Region, b: &Region, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.right() - b.right()).abs() as f64 <= delta
        && (a.bottom() - b.bottom()).abs() as f64 <= delta
}

/// Union-find over the similarity relation. Class labels are numbered in
/// order of first appearance.
fn partition(rects: &[Region], eps: f64) -> (Vec<usize>, usize) {
    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = rj.min(ri);
                }
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut nclasses = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if class_of_root[root] == usize::MAX {
            class_of_root[root] = nclasses;
            nclasses += 1;
        }
        labels.push(class_of_root[root]);
    }
    (labels, nclasses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::GROUP_EPS;

    fn cluster_around(x: i32, y: i32, size: i32, count: usize) -> Vec<Region> {
        (0..count)
            .map(|k| Region::new(x + k as i32, y + (k as i32 % 2), size, size))
            .collect()
    }

    #[test]
    fn test_zero_threshold_returns_input() {
        let rects = vec![Region::new(0, 0, 10, 10), Region::new(1, 1, 10, 10)];
        assert_eq!(group_rectangles(&rects, 0, GROUP_EPS), rects);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_rectangles(&[], 2, GROUP_EPS).is_empty());
    }

    #[test]
    fn test_cluster_is_averaged() {
        let rects = vec![
            Region::new(100, 100, 50, 50),
            Region::new(102, 100, 50, 50),
            Region::new(104, 100, 50, 50),
        ];
        let grouped = group_rectangles(&rects, 2, GROUP_EPS);
        assert_eq!(grouped, vec![Region::new(102, 100, 50, 50)]);
    }

    #[test]
    fn test_cluster_at_threshold_is_dropped() {
        // two hits, min neighbors 2 -> needs at least three
        let rects = cluster_around(50, 50, 40, 2);
        assert!(group_rectangles(&rects, 2, GROUP_EPS).is_empty());
    }

    #[test]
    fn test_separate_clusters_keep_first_appearance_order() {
        let mut rects = cluster_around(300, 50, 40, 4);
        rects.extend(cluster_around(20, 20, 40, 3));
        let grouped = group_rectangles(&rects, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 2);
        assert!(grouped[0].x > 250);
        assert!(grouped[1].x < 50);
    }

    #[test]
    fn test_isolated_hit_is_noise() {
        let mut rects = cluster_around(100, 100, 60, 5);
        rects.push(Region::new(400, 400, 40, 40));
        let grouped = group_rectangles(&rects, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
    }

    #[test]
    fn test_weak_inner_cluster_is_suppressed_by_strong_outer() {
        // strong cluster of 8 around a 100x100 box
        let mut rects = cluster_around(100, 100, 100, 8);
        // weak cluster of 3 nested inside it
        rects.extend(cluster_around(130, 130, 30, 3));
        let grouped = group_rectangles(&rects, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].width, 100);
    }

    #[test]
    fn test_similarity_is_scale_relative() {
        let a = Region::new(0, 0, 100, 100);
        assert!(similar(&a, &Region::new(20, 0, 100, 100), 0.2));
        assert!(!similar(&a, &Region::new(21, 0, 100, 100), 0.2));
    }
}
