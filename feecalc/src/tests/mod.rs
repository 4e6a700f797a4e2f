// Value and coercion tests
mod coercion;


// Evaluation tests
mod evaluator;

// Engine and context tests
mod aggregate;
