/// An axis-aligned detection rectangle in frame pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_edges() {
        let r = Region::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
    }

    #[rstest]
    #[case::disjoint(Region::new(0, 0, 50, 50), Region::new(100, 100, 50, 50), false)]
    #[case::touching(Region::new(0, 0, 50, 50), Region::new(50, 0, 50, 50), false)]
    #[case::overlapping(Region::new(0, 0, 50, 50), Region::new(49, 49, 10, 10), true)]
    #[case::contained(Region::new(0, 0, 100, 100), Region::new(25, 25, 10, 10), true)]
    fn test_intersects(#[case] a: Region, #[case] b: Region, #[case] expected: bool) {
        assert_eq!(a.intersects(&b), expected);
        assert_eq!(b.intersects(&a), expected);
    }
}
