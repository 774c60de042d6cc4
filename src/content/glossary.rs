// src/content/glossary.rs
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::analysis::AnalysisKind;

type Entries = &'static [(&'static str, &'static str)];

const RDD_TERMS: Entries = &[
    ("Running variable", "The continuous variable that determines treatment assignment. Units on one side of the cutoff are treated, units on the other side are not."),
    ("Cutoff", "The threshold value of the running variable at which treatment status changes."),
    ("Bandwidth", "How far from the cutoff observations are used. Smaller bandwidths compare more similar units but use fewer observations."),
    ("Kernel", "The weighting scheme for observations within the bandwidth. A triangular kernel gives more weight to observations close to the cutoff."),
    ("Local polynomial", "A regression fitted separately on each side of the cutoff using only nearby observations."),
    ("Treatment effect", "The size of the jump in the outcome at the cutoff, interpreted as the causal effect for units near the cutoff."),
    ("Manipulation test", "A check of whether units bunch just above or below the cutoff, which would suggest they could influence their own assignment."),
    ("Robustness check", "Re-estimating the effect with different bandwidths to see whether the conclusion depends on that choice."),
    ("Confidence interval", "A range of plausible values for the effect. A 95% interval that excludes zero corresponds to significance at the 5% level."),
    ("P-value", "The probability of seeing an effect at least this large if there were truly no effect."),
];

const DBSCAN_TERMS: Entries = &[
    ("Epsilon", "The radius around each point within which neighbors are counted. Larger values merge nearby groups into bigger clusters."),
    ("Eps", "Short for epsilon: the neighborhood radius used to find dense regions."),
    ("Minimum samples", "How many points must lie within epsilon of a point for it to be a core point."),
    ("Core point", "A point with at least the minimum number of neighbors within epsilon. Clusters grow outward from core points."),
    ("Border point", "A point within epsilon of a core point that does not have enough neighbors to be a core point itself."),
    ("Noise", "Points that are neither core nor border points. They are labeled -1 and belong to no cluster."),
    ("Standardization", "Rescaling each variable to mean 0 and standard deviation 1 so that no variable dominates the distance."),
    ("Silhouette score", "A measure from -1 to 1 of how well each point fits its own cluster compared with the nearest other cluster."),
];

const KMEANS_TERMS: Entries = &[
    ("Centroid", "The center of a cluster, computed as the mean of the points assigned to it."),
    ("Number of clusters", "The k in K-Means: how many groups the algorithm will form. It must be chosen in advance."),
    ("K", "The number of clusters the algorithm will form."),
    ("Inertia", "The sum of squared distances from each point to its centroid. Lower is tighter, but it always falls as k grows."),
    ("Elbow method", "Plotting inertia against k and choosing the point where adding clusters stops helping much."),
    ("Silhouette score", "A measure from -1 to 1 of how well each point fits its own cluster compared with the nearest other cluster."),
    ("Standardization", "Rescaling each variable to mean 0 and standard deviation 1 so that no variable dominates the distance."),
    ("Maximum iterations", "The upper limit on how many times centroids are recomputed before the algorithm stops."),
];

const KRUSKAL_TERMS: Entries = &[
    ("H statistic", "The Kruskal-Wallis test statistic. Larger values mean the groups' rank distributions differ more."),
    ("Rank", "The position of a value when all observations are sorted together. The test works on ranks instead of raw values."),
    ("Mean rank", "The average rank of a group's observations. Groups with higher values have higher mean ranks."),
    ("Non-parametric", "A method that does not assume the data follow a particular distribution such as the normal distribution."),
    ("Degrees of freedom", "The number of groups minus one; it sets the reference chi-squared distribution."),
    ("Post-hoc test", "Follow-up comparisons between pairs of groups, run after a significant overall result."),
    ("Dunn test", "A post-hoc test that compares mean ranks for every pair of groups, adjusting p-values for multiple comparisons."),
    ("Epsilon squared", "An effect size for the Kruskal-Wallis test, between 0 and 1, describing how much of the rank variation is explained by group."),
    ("P-value", "The probability of differences at least this large if all groups came from the same distribution."),
];

const BOOSTING_TERMS: Entries = &[
    ("Estimator", "One decision tree in the ensemble. Boosting adds trees one at a time."),
    ("Number of estimators", "How many trees are fitted in sequence. More trees can fit better but take longer and can overfit."),
    ("Learning rate", "How much each new tree's correction is scaled down. Smaller rates need more trees but usually generalize better."),
    ("Maximum depth", "How many splits a single tree may make from root to leaf. Shallow trees keep each step simple."),
    ("Test size", "The share of rows held back to evaluate the model on data it did not see during training."),
    ("Feature importance", "How much each feature contributed to reducing prediction error across all trees."),
    ("Overfitting", "When a model learns noise in the training data and performs worse on new data."),
    ("R squared", "The share of the target's variance explained by the model on the test set; 1 is a perfect fit."),
    ("RMSE", "Root mean squared error: the typical size of a prediction error, in the target's units."),
    ("Accuracy", "The share of test rows whose class was predicted correctly."),
];

const SPATIAL_TERMS: Entries = &[
    ("Spatial autocorrelation", "The tendency of nearby locations to have similar values."),
    ("Spatial lag model", "A model in which each location's outcome depends directly on its neighbors' outcomes."),
    ("Spatial error model", "A model in which the unexplained part of the outcome is correlated between neighbors."),
    ("Rho", "The spatial lag coefficient: how strongly a location's outcome follows its neighbors' outcomes."),
    ("Lambda", "The spatial error coefficient: how strongly unexplained variation is shared between neighbors."),
    ("Spatial weights", "The matrix describing which locations are neighbors and how much each neighbor counts."),
    ("K nearest neighbors", "A weights scheme in which each location's neighbors are its k closest locations."),
    ("Moran's I", "A statistic measuring spatial autocorrelation, from about -1 (dispersed) to 1 (clustered)."),
    ("AIC", "Akaike information criterion: lower values indicate a better balance of fit and complexity."),
    ("Log-likelihood", "How probable the observed data are under the fitted model; higher is better."),
];

fn entries(kind: AnalysisKind) -> Entries {
    match kind {
        AnalysisKind::RegressionDiscontinuity => RDD_TERMS,
        AnalysisKind::Dbscan => DBSCAN_TERMS,
        AnalysisKind::KMeans => KMEANS_TERMS,
        AnalysisKind::KruskalWallis => KRUSKAL_TERMS,
        AnalysisKind::GradientBoosting => BOOSTING_TERMS,
        AnalysisKind::SpatialAutoregressive => SPATIAL_TERMS,
    }
}

fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

static INDEX: Lazy<HashMap<AnalysisKind, HashMap<String, &'static str>>> = Lazy::new(|| {
    AnalysisKind::ALL
        .iter()
        .map(|&kind| {
            let table = entries(kind)
                .iter()
                .map(|(term, definition)| (normalize(term), *definition))
                .collect();
            (kind, table)
        })
        .collect()
});

/// Definition of a term on the given page, ignoring case and surrounding space.
pub fn lookup(kind: AnalysisKind, term: &str) -> Option<&'static str> {
    INDEX.get(&kind)?.get(&normalize(term)).copied()
}

/// Terms in display order.
pub fn terms(kind: AnalysisKind) -> Vec<&'static str> {
    entries(kind).iter().map(|(term, _)| *term).collect()
}
