pub mod foursquare;
