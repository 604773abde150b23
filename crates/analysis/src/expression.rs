//! Typed builder for compute-service expressions.
//!
//! The service evaluates a graph of function invocations encoded as JSON:
//!
//! ```json
//! {"result": "0", "values": {"0": {"functionInvocationValue": {
//!     "functionName": "Collection.size",
//!     "arguments": {"collection": {...}}}}}}
//! ```
//!
//! An [`Expression`] is an owned tree. [`Expression::to_graph`] flattens it
//! into that encoding, hoisting function bodies into the value table as the
//! service requires.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use climate_common::Geometry;

/// A node in a service expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal JSON value
    Constant(Value),
    /// A named service function applied to named arguments
    Call {
        function: String,
        arguments: IndexMap<String, Expression>,
    },
    /// Reference to an argument of the enclosing [`Expression::Function`]
    Argument(String),
    /// An anonymous function, as passed to `Collection.map` or `Collection.iterate`
    Function {
        parameters: Vec<String>,
        body: Box<Expression>,
    },
    Array(Vec<Expression>),
    Dictionary(IndexMap<String, Expression>),
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    /// Invoke a service function.
    pub fn call<I, K>(function: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, Expression)>,
        K: Into<String>,
    {
        Expression::Call {
            function: function.to_string(),
            arguments: arguments.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn argument(name: &str) -> Self {
        Expression::Argument(name.to_string())
    }

    pub fn function(parameters: &[&str], body: Expression) -> Self {
        Expression::Function {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }

    /// Name of the outermost function call, if this is a call.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expression::Call { function, .. } => Some(function),
            _ => None,
        }
    }

    /// Encode as the service's value-graph JSON.
    pub fn to_graph(&self) -> Value {
        let mut encoder = GraphEncoder::default();
        let root = encoder.encode(self);
        let result = encoder.insert(root);
        json!({
            "result": result,
            "values": encoder.values,
        })
    }
}

#[derive(Default)]
struct GraphEncoder {
    values: BTreeMap<String, Value>,
}

impl GraphEncoder {
    fn insert(&mut self, node: Value) -> String {
        let id = self.values.len().to_string();
        self.values.insert(id.clone(), node);
        id
    }

    fn encode(&mut self, expr: &Expression) -> Value {
        match expr {
            Expression::Constant(v) => json!({ "constantValue": v }),
            Expression::Call {
                function,
                arguments,
            } => {
                let args: Map<String, Value> = arguments
                    .iter()
                    .map(|(k, v)| (k.clone(), self.encode(v)))
                    .collect();
                json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": args,
                    }
                })
            }
            Expression::Argument(name) => json!({ "argumentReference": name }),
            Expression::Function { parameters, body } => {
                let body = self.encode(body);
                let body_ref = self.insert(body);
                json!({
                    "functionDefinitionValue": {
                        "argumentNames": parameters,
                        "body": body_ref,
                    }
                })
            }
            Expression::Array(items) => {
                let values: Vec<Value> = items.iter().map(|v| self.encode(v)).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Expression::Dictionary(entries) => {
                let values: Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.encode(v)))
                    .collect();
                json!({ "dictionaryValue": { "values": values } })
            }
        }
    }
}

// ============================================================================
// Service function helpers
// ============================================================================

pub fn load_collection(id: &str) -> Expression {
    Expression::call("ImageCollection.load", [("id", Expression::constant(id))])
}

/// Keep images whose start time lies in `[start, end)`, dates as `YYYY-MM-DD`.
pub fn filter_date(collection: Expression, start: &str, end: &str) -> Expression {
    let range = Expression::call(
        "DateRange",
        [
            ("start", Expression::constant(start)),
            ("end", Expression::constant(end)),
        ],
    );
    let filter = Expression::call(
        "Filter.dateRangeContains",
        [
            ("leftValue", range),
            ("rightField", Expression::constant("system:time_start")),
        ],
    );
    Expression::call(
        "Collection.filter",
        [("collection", collection), ("filter", filter)],
    )
}

/// Keep images whose footprint intersects the geometry.
pub fn filter_bounds(collection: Expression, geometry: Expression) -> Expression {
    let filter = Expression::call(
        "Filter.intersects",
        [
            ("leftField", Expression::constant(".all")),
            ("rightValue", geometry),
        ],
    );
    Expression::call(
        "Collection.filter",
        [("collection", collection), ("filter", filter)],
    )
}

/// Map a one-argument image function over a collection.
pub fn map_images(collection: Expression, body: impl FnOnce(Expression) -> Expression) -> Expression {
    const IMAGE: &str = "_MAPPING_VAR_0_0";
    let function = Expression::function(&[IMAGE], body(Expression::argument(IMAGE)));
    Expression::call(
        "Collection.map",
        [("collection", collection), ("baseAlgorithm", function)],
    )
}

pub fn select_band(image: Expression, band: &str) -> Expression {
    Expression::call(
        "Image.select",
        [
            ("input", image),
            ("bandSelectors", Expression::constant(vec![band])),
        ],
    )
}

pub fn rename_bands(image: Expression, names: &[&str]) -> Expression {
    Expression::call(
        "Image.rename",
        [("input", image), ("names", Expression::constant(names.to_vec()))],
    )
}

pub fn reducer(name: &str) -> Expression {
    Expression::Call {
        function: format!("Reducer.{}", name),
        arguments: IndexMap::new(),
    }
}

pub fn percentile_reducer(percentiles: &[f64]) -> Expression {
    Expression::call(
        "Reducer.percentile",
        [("percentiles", Expression::constant(percentiles.to_vec()))],
    )
}

/// Reduce a collection to a single image.
pub fn reduce_collection(collection: Expression, reducer: Expression) -> Expression {
    Expression::call(
        "ImageCollection.reduce",
        [("collection", collection), ("reducer", reducer)],
    )
}

pub fn collection_size(collection: Expression) -> Expression {
    Expression::call("Collection.size", [("collection", collection)])
}

pub fn constant_image(value: f64) -> Expression {
    Expression::call("Image.constant", [("value", Expression::constant(value))])
}

/// Pixel-wise binary operator such as `Image.multiply` or `Image.gte`.
pub fn binary(function: &str, left: Expression, right: Expression) -> Expression {
    Expression::call(function, [("image1", left), ("image2", right)])
}

pub fn clip(image: Expression, geometry: Expression) -> Expression {
    Expression::call("Image.clip", [("input", image), ("geometry", geometry)])
}

/// Reduce an image over a region to a dictionary keyed by band output names.
pub fn reduce_region(
    image: Expression,
    reducer: Expression,
    geometry: Expression,
    scale: f64,
    max_pixels: f64,
) -> Expression {
    Expression::call(
        "Image.reduceRegion",
        [
            ("image", image),
            ("reducer", reducer),
            ("geometry", geometry),
            ("scale", Expression::constant(scale)),
            ("maxPixels", Expression::constant(max_pixels)),
        ],
    )
}

/// Region geometry as a service geometry constructor.
pub fn geometry(geometry: &Geometry) -> Expression {
    let geojson = geometry.to_geojson();
    let constructor = match geometry {
        Geometry::MultiPolygon { .. } => "GeometryConstructors.MultiPolygon",
        Geometry::Rectangle(_) | Geometry::Polygon { .. } => "GeometryConstructors.Polygon",
    };
    Expression::call(
        constructor,
        [
            ("coordinates", Expression::Constant(geojson["coordinates"].clone())),
            ("geodesic", Expression::constant(false)),
        ],
    )
}
