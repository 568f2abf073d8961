pub mod fill_bar;
