// src/content/guide.rs
use crate::analysis::AnalysisKind;
use crate::wizard::Step;

/// Short instructions shown above each step.
pub fn guide(kind: AnalysisKind, step: Step) -> &'static str {
    use AnalysisKind::*;

    match (kind, step) {
        (RegressionDiscontinuity, Step::Variables) => "Choose the outcome you want to measure and the running variable that decides who is treated.",
        (Dbscan, Step::Variables) | (KMeans, Step::Variables) => "Pick at least two numeric variables. Clusters are formed from the distances between rows on these variables.",
        (KruskalWallis, Step::Variables) => "Choose a grouping column and the numeric value to compare across groups.",
        (GradientBoosting, Step::Variables) => "Choose the target to predict and the features the model may use. The target cannot also be a feature.",
        (SpatialAutoregressive, Step::Variables) => "Choose the dependent variable, its predictors, and the latitude and longitude columns.",

        (RegressionDiscontinuity, Step::Settings) => "Set the cutoff where treatment begins. Leave the bandwidth empty to let the service choose it.",
        (Dbscan, Step::Settings) => "Epsilon sets the neighborhood radius and minimum samples sets how dense a region must be to form a cluster.",
        (KMeans, Step::Settings) => "Choose how many clusters to form and the iteration limit.",
        (KruskalWallis, Step::Settings) => "Enable post-hoc comparisons to see which pairs of groups differ.",
        (GradientBoosting, Step::Settings) => "Tune the number of trees, learning rate, tree depth and the share of rows held out for testing.",
        (SpatialAutoregressive, Step::Settings) => "Choose the number of neighbors per location and whether to fit a spatial lag or spatial error model.",

        (_, Step::Validation) => "Review the checks below. Every required check must pass before the analysis can run.",
        (_, Step::Summary) => "The main findings in plain language.",
        (_, Step::Reasoning) => "How the method works and what to keep in mind when interpreting the results.",
        (_, Step::Statistics) => "The full statistical output. Export it as CSV, PNG or a Word report.",
    }
}
