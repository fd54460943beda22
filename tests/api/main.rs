mod cart;
mod helpers;
mod products;
