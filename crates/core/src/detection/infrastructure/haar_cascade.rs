use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use thiserror::Error;

use super::integral_image::IntegralImage;

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("cascade is missing <{0}>")]
    MissingElement(String),
    #[error("invalid number '{value}' in <{element}>")]
    InvalidNumber { element: String, value: String },
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
    #[error("inconsistent cascade: {0}")]
    Inconsistent(String),
    #[error("invalid detection parameters: {0}")]
    InvalidParams(String),
}

/// One rectangle of a Haar feature, in window coordinates. For tilted
/// features `(x, y)` is the top corner of the rectangle rotated by 45°.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
    pub tilted: bool,
}

impl HaarFeature {
    fn raw_value(&self, integral: &IntegralImage, x: usize, y: usize) -> f64 {
        self.rects
            .iter()
            .map(|r| {
                let (rx, ry) = (x + r.x as usize, y + r.y as usize);
                let (rw, rh) = (r.width as usize, r.height as usize);
                let sum = if self.tilted {
                    integral.tilted_sum(rx, ry, rw, rh)
                } else {
                    integral.rect_sum(rx, ry, rw, rh)
                };
                sum as f64 * r.weight
            })
            .sum()
    }

    fn fits(&self, window_width: u32, window_height: u32) -> bool {
        self.rects.iter().all(|r| {
            if self.tilted {
                r.x >= r.height
                    && r.x + r.width <= window_width
                    && r.y + r.width + r.height <= window_height
            } else {
                r.x + r.width <= window_width && r.y + r.height <= window_height
            }
        })
    }
}

/// Split node of a weak classifier tree. Children `<= 0` index leaves by
/// their negation; positive children index further nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeakClassifier {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f64>,
}

impl WeakClassifier {
    fn evaluate(&self, mut feature_value: impl FnMut(usize) -> f64) -> f64 {
        let mut idx = 0i32;
        loop {
            let node = &self.nodes[idx as usize];
            idx = if feature_value(node.feature) < node.threshold {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return self.leaves[(-idx) as usize];
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f64,
    pub classifiers: Vec<WeakClassifier>,
}

/// A boosted Haar cascade read from OpenCV's `opencv-cascade-classifier`
/// layout or the older `opencv-haar-classifier` layout.
///
/// Immutable once loaded; evaluation only reads from it.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn load(path: &Path) -> Result<Self, CascadeLoadError> {
        let xml = fs::read_to_string(path).map_err(|e| CascadeLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cascade = Self::parse(&xml)?;
        log::info!(
            "Loaded cascade {} ({}x{} window, {} stages, {} features)",
            path.display(),
            cascade.window_width,
            cascade.window_height,
            cascade.stages.len(),
            cascade.features.len()
        );
        Ok(cascade)
    }

    pub fn parse(xml: &str) -> Result<Self, CascadeLoadError> {
        let doc = roxmltree::Document::parse(xml)?;
        let storage = doc.root_element();

        let cascade = if let Some(root) = child(storage, "cascade") {
            Self::parse_current(root)?
        } else if let Some(root) =
            elements(storage).find(|n| n.attribute("type_id") == Some("opencv-haar-classifier"))
        {
            Self::parse_legacy(root)?
        } else {
            return Err(CascadeLoadError::MissingElement("cascade".to_string()));
        };
        cascade.validate()?;
        Ok(cascade)
    }

    fn parse_current(root: Node<'_, '_>) -> Result<Self, CascadeLoadError> {
        let stage_type = required_text(root, "stageType")?;
        if stage_type.trim() != "BOOST" {
            return Err(CascadeLoadError::Unsupported(format!(
                "stage type {}",
                stage_type.trim()
            )));
        }
        let feature_type = required_text(root, "featureType")?;
        if feature_type.trim() != "HAAR" {
            return Err(CascadeLoadError::Unsupported(format!(
                "feature type {}",
                feature_type.trim()
            )));
        }

        let features = elements(required(root, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>, _>>()?;

        let stages = elements(required(root, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            window_width: parse_scalar::<u32>(root, "width")?,
            window_height: parse_scalar::<u32>(root, "height")?,
            stages,
            features,
        })
    }

    /// Every tree node of the legacy layout carries its own feature, so
    /// features are collected in node order while the stages are read.
    fn parse_legacy(root: Node<'_, '_>) -> Result<Self, CascadeLoadError> {
        let size = parse_numbers(required(root, "size")?, "size")?;
        let &[width, height] = size.as_slice() else {
            return Err(CascadeLoadError::Inconsistent(format!(
                "<size> holds {} values, expected 2",
                size.len()
            )));
        };
        if width < 0.0 || height < 0.0 || width.fract() != 0.0 || height.fract() != 0.0 {
            return Err(CascadeLoadError::Inconsistent(format!(
                "window size {width} {height} is not a pair of integers"
            )));
        }

        let mut features = Vec::new();
        let mut stages = Vec::new();
        for stage in elements(required(root, "stages")?) {
            let mut classifiers = Vec::new();
            for tree in elements(required(stage, "trees")?) {
                classifiers.push(parse_legacy_tree(tree, &mut features)?);
            }
            stages.push(Stage {
                threshold: parse_scalar::<f64>(stage, "stage_threshold")?,
                classifiers,
            });
        }

        Ok(Self {
            window_width: width as u32,
            window_height: height as u32,
            stages,
            features,
        })
    }

    /// Base detection window as (width, height).
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Whether any feature needs the rotated integral table.
    pub fn has_tilted(&self) -> bool {
        self.features.iter().any(|f| f.tilted)
    }

    /// Runs every stage on the window whose top-left corner is `(x, y)`.
    ///
    /// The caller guarantees the window lies inside the integral image.
    pub fn evaluate(&self, integral: &IntegralImage, x: usize, y: usize) -> bool {
        let (w, h) = (self.window_width as usize, self.window_height as usize);
        let inv_norm = 1.0 / integral.variance_norm(x + 1, y + 1, w - 2, h - 2);

        for stage in &self.stages {
            let score: f64 = stage
                .classifiers
                .iter()
                .map(|wc| {
                    wc.evaluate(|fi| self.features[fi].raw_value(integral, x, y) * inv_norm)
                })
                .sum();
            if score < stage.threshold {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<(), CascadeLoadError> {
        if self.window_width < 3 || self.window_height < 3 {
            return Err(CascadeLoadError::Inconsistent(format!(
                "window {}x{} is too small",
                self.window_width, self.window_height
            )));
        }
        if self.stages.is_empty() {
            return Err(CascadeLoadError::Inconsistent("no stages".to_string()));
        }
        for (fi, feature) in self.features.iter().enumerate() {
            if !feature.fits(self.window_width, self.window_height) {
                return Err(CascadeLoadError::Inconsistent(format!(
                    "feature {fi} extends outside the {}x{} window",
                    self.window_width, self.window_height
                )));
            }
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.classifiers.is_empty() {
                return Err(CascadeLoadError::Inconsistent(format!(
                    "stage {si} has no weak classifiers"
                )));
            }
            for wc in &stage.classifiers {
                self.validate_tree(si, wc)?;
            }
        }
        Ok(())
    }

    fn validate_tree(&self, si: usize, wc: &WeakClassifier) -> Result<(), CascadeLoadError> {
        let bad = |msg: String| CascadeLoadError::Inconsistent(format!("stage {si}: {msg}"));
        for (ni, node) in wc.nodes.iter().enumerate() {
            if node.feature >= self.features.len() {
                return Err(bad(format!("feature index {} out of range", node.feature)));
            }
            for child in [node.left, node.right] {
                if child > 0 {
                    // children must come later so traversal terminates
                    if child as usize <= ni || child as usize >= wc.nodes.len() {
                        return Err(bad(format!("node {ni} has invalid child {child}")));
                    }
                } else if (-child) as usize >= wc.leaves.len() {
                    return Err(bad(format!("node {ni} refers to missing leaf {}", -child)));
                }
            }
        }
        Ok(())
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.tag_name().name() == name)
}

fn required<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Result<Node<'a, 'input>, CascadeLoadError> {
    child(node, name).ok_or_else(|| CascadeLoadError::MissingElement(name.to_string()))
}

/// Concatenated text content, skipping comments.
fn text_of(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn required_text(node: Node<'_, '_>, name: &str) -> Result<String, CascadeLoadError> {
    required(node, name).map(text_of)
}

fn parse_scalar<T: std::str::FromStr>(
    node: Node<'_, '_>,
    name: &str,
) -> Result<T, CascadeLoadError> {
    let text = required_text(node, name)?;
    let trimmed = text.trim();
    trimmed
        .parse::<T>()
        .map_err(|_| CascadeLoadError::InvalidNumber {
            element: name.to_string(),
            value: trimmed.to_string(),
        })
}

fn parse_numbers(node: Node<'_, '_>, name: &str) -> Result<Vec<f64>, CascadeLoadError> {
    text_of(node)
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| CascadeLoadError::InvalidNumber {
                    element: name.to_string(),
                    value: tok.to_string(),
                })
        })
        .collect()
}

fn parse_stage(node: Node<'_, '_>) -> Result<Stage, CascadeLoadError> {
    let threshold = parse_scalar::<f64>(node, "stageThreshold")?;
    let classifiers = elements(required(node, "weakClassifiers")?)
        .map(parse_weak_classifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak_classifier(node: Node<'_, '_>) -> Result<WeakClassifier, CascadeLoadError> {
    let raw = parse_numbers(required(node, "internalNodes")?, "internalNodes")?;
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(CascadeLoadError::Inconsistent(format!(
            "internalNodes holds {} values, expected groups of 4",
            raw.len()
        )));
    }
    let nodes = raw
        .chunks_exact(4)
        .map(|c| {
            if c[2] < 0.0 || c[2].fract() != 0.0 {
                return Err(CascadeLoadError::Inconsistent(format!(
                    "invalid feature index {}",
                    c[2]
                )));
            }
            Ok(TreeNode {
                left: c[0] as i32,
                right: c[1] as i32,
                feature: c[2] as usize,
                threshold: c[3],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let leaves = parse_numbers(required(node, "leafValues")?, "leafValues")?;
    Ok(WeakClassifier { nodes, leaves })
}

fn parse_legacy_tree(
    tree: Node<'_, '_>,
    features: &mut Vec<HaarFeature>,
) -> Result<WeakClassifier, CascadeLoadError> {
    let mut nodes = Vec::new();
    let mut leaves = Vec::new();
    for node in elements(tree) {
        features.push(parse_feature(required(node, "feature")?)?);
        nodes.push(TreeNode {
            feature: features.len() - 1,
            threshold: parse_scalar::<f64>(node, "threshold")?,
            left: legacy_branch(node, "left", &mut leaves)?,
            right: legacy_branch(node, "right", &mut leaves)?,
        });
    }
    if nodes.is_empty() {
        return Err(CascadeLoadError::Inconsistent("empty tree".to_string()));
    }
    Ok(WeakClassifier { nodes, leaves })
}

/// Reads `<side>_node` as a node index, or `<side>_val` as a new leaf
/// referenced by its negated index.
fn legacy_branch(
    node: Node<'_, '_>,
    side: &str,
    leaves: &mut Vec<f64>,
) -> Result<i32, CascadeLoadError> {
    let node_tag = format!("{side}_node");
    if child(node, &node_tag).is_some() {
        let idx = parse_scalar::<i32>(node, &node_tag)?;
        if idx <= 0 {
            return Err(CascadeLoadError::Inconsistent(format!(
                "<{node_tag}> must point forward, got {idx}"
            )));
        }
        return Ok(idx);
    }
    leaves.push(parse_scalar::<f64>(node, &format!("{side}_val"))?);
    Ok(-((leaves.len() - 1) as i32))
}

fn parse_feature(node: Node<'_, '_>) -> Result<HaarFeature, CascadeLoadError> {
    let tilted = match child(node, "tilted") {
        Some(_) => parse_scalar::<u8>(node, "tilted")? != 0,
        None => false,
    };
    let rects = elements(required(node, "rects")?)
        .map(|r| {
            let v = parse_numbers(r, "rects")?;
            if v.len() != 5 || v[..4].iter().any(|c| *c < 0.0 || c.fract() != 0.0) {
                return Err(CascadeLoadError::Inconsistent(format!(
                    "feature rectangle '{}' is not 'x y w h weight'",
                    text_of(r).trim()
                )));
            }
            Ok(WeightedRect {
                x: v[0] as u32,
                y: v[1] as u32,
                width: v[2] as u32,
                height: v[3] as u32,
                weight: v[4],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rects.is_empty() {
        return Err(CascadeLoadError::Inconsistent(
            "feature without rectangles".to_string(),
        ));
    }
    Ok(HaarFeature { rects, tilted })
}
