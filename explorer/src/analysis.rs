pub mod overview_plot;
pub mod pathway_summary;
pub mod reaction_view;
