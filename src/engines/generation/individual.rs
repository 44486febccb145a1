/// Candidate counterfactual in encoded feature space
///
/// An individual is one value per schema feature, in schema order:
/// - Continuous features hold raw values inside their feature range
/// - Categorical and sequence features hold label codes from the encoder
///
/// # Per-phase use
///
/// Every phase of the search works feature by feature:
/// - **Mating**: offspring pick each position from a parent or a fresh draw
/// - **Fitness**: proximity and sparsity compare positions with the query
/// - **Conformance**: sequence positions decode straight into a trace
///
/// Identity is the position in the current population; two individuals with
/// identical values are duplicates and collapse during deduplication.
///
/// # Conversion
///
/// Use `Encoder::decode()` to get domain values back.
///
/// # Example
///
/// ```
/// let individual: conformcf::engines::generation::Individual = vec![25.0, 30000.0, 1.0, 3.0];
/// // With prefix codes {1: "apply", 3: "review"} this decodes to
/// // {age: 25, income: 30000, prefix_1: "apply", prefix_2: "review"}
/// assert_eq!(individual.len(), 4);
/// ```
pub type Individual = Vec<f64>;
